//! Link handling: URL extraction from page content and `add-new` list parsing.
//!
//! # Example
//!
//! ```
//! use orchestrator_core::links::{extract_links, parse_link_list};
//!
//! let links = extract_links("Get https://a.test/x.zip now");
//! assert_eq!(links, vec!["https://a.test/x.zip"]);
//!
//! let requests = parse_link_list("5|https://a.test/x.zip, https://a.test/y.zip");
//! assert_eq!(requests[0].thread_count(), 5);
//! assert_eq!(requests[1].thread_count(), 3);
//! ```

mod extract;
mod request;

pub use extract::extract_links;
pub use request::{LinkRequest, parse_link_list};

use std::collections::HashSet;

/// Concatenates link sources, dropping empties and repeats.
///
/// Order is first occurrence across all sources.
#[must_use]
pub fn merge_links<I, S>(sources: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .map(Into::into)
        .filter(|link| !link.is_empty() && seen.insert(link.clone()))
        .collect()
}
