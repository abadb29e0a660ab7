//! Domain models for serpwatch.

mod keyword;
mod page_tag;
mod run;
mod schedule;
mod scheduler_status;
mod search_result;
mod tracked;

pub use keyword::{Keyword, KeywordSpec, DEFAULT_LANGUAGE};
pub use page_tag::{
    HreflangMap, IdentityTags, PageTag, PageTags, TagComparison, TagPayload, WatchUrl,
    DEFAULT_WATCH_REGION,
};
pub use run::{truncate_error, Run, RunKind, RunStatus, MAX_ERROR_LEN};
pub use schedule::{clamp_interval_hours, KeywordSchedule, MAX_INTERVAL_HOURS, MIN_INTERVAL_HOURS};
pub use scheduler_status::{SchedulerStatus, KEYWORD_SCHEDULER};
pub use search_result::{OrganicResult, SearchResult};
pub use tracked::{TrackedHit, TrackedSite};
