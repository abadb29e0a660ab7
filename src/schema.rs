// Mirrors the tables created by the cetane migrations in `crate::migrations`.

diesel::table! {
    keywords (id) {
        id -> BigInt,
        keyword -> Text,
        region -> Text,
        language -> Text,
        proxy_profile -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    keyword_schedules (id) {
        id -> BigInt,
        keyword_id -> BigInt,
        interval_hours -> Integer,
        active -> Bool,
        last_run_at -> Nullable<Text>,
        next_run_at -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    runs (id) {
        id -> BigInt,
        kind -> Text,
        status -> Text,
        started_at -> Text,
        finished_at -> Nullable<Text>,
        error -> Nullable<Text>,
    }
}

diesel::table! {
    serp_results (id) {
        id -> BigInt,
        run_id -> BigInt,
        keyword_id -> BigInt,
        position -> Integer,
        title -> Nullable<Text>,
        link -> Text,
        snippet -> Nullable<Text>,
        raw -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    tracked_sites (id) {
        id -> BigInt,
        domain -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    tracked_hits (id) {
        id -> BigInt,
        tracked_site_id -> BigInt,
        run_id -> BigInt,
        keyword_id -> BigInt,
        position -> Integer,
        url -> Text,
        detected_at -> Text,
    }
}

diesel::table! {
    watch_urls (id) {
        id -> BigInt,
        url -> Text,
        region -> Text,
        proxy_profile -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    page_tags (id) {
        id -> BigInt,
        run_id -> BigInt,
        watch_url_id -> BigInt,
        canonical -> Nullable<Text>,
        hreflang -> Nullable<Text>,
        raw -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    scheduler_status (name) {
        name -> Text,
        running -> Bool,
        last_heartbeat -> Nullable<Text>,
        host -> Nullable<Text>,
        version -> Nullable<Text>,
        updated_at -> Text,
    }
}

diesel::joinable!(keyword_schedules -> keywords (keyword_id));
diesel::joinable!(serp_results -> runs (run_id));
diesel::joinable!(serp_results -> keywords (keyword_id));
diesel::joinable!(tracked_hits -> tracked_sites (tracked_site_id));
diesel::joinable!(tracked_hits -> runs (run_id));
diesel::joinable!(page_tags -> runs (run_id));
diesel::joinable!(page_tags -> watch_urls (watch_url_id));

diesel::allow_tables_to_appear_in_same_query!(
    keywords,
    keyword_schedules,
    runs,
    serp_results,
    tracked_sites,
    tracked_hits,
    watch_urls,
    page_tags,
    scheduler_status,
);
