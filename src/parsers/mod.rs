//! Pure parsers for search payloads and fetched pages.

pub mod organic;
pub mod page_tags;

pub use organic::parse_organic;
pub use page_tags::{parse_link_header, parse_tags, LinkEntry};
