//! Parsing of `add-new` link lists.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::{DEFAULT_LINK_THREADS, THREAD_CEILING, clamp_threads};

/// Leading `<digits>|` thread-count prefix.
#[allow(clippy::expect_used)]
static THREAD_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\|").expect("thread prefix regex is valid"));

/// One entry of an `add-new` list: a URL plus an optional thread override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    /// URL with any `<n>|` prefix removed. Not validated.
    pub url: String,
    /// Requested thread count, already clamped. `None` means no prefix.
    pub threads: Option<u32>,
}

impl LinkRequest {
    /// Parses a single entry, stripping a `<n>|` prefix if present.
    ///
    /// A prefix of `0` counts as absent. Values above the ceiling, including
    /// ones too large for `u32`, clamp to [`THREAD_CEILING`].
    ///
    /// # Examples
    ///
    /// ```
    /// use orchestrator_core::links::LinkRequest;
    ///
    /// let request = LinkRequest::parse("12|https://a.test/x.zip");
    /// assert_eq!(request.url, "https://a.test/x.zip");
    /// assert_eq!(request.thread_count(), 8);
    /// ```
    #[must_use]
    pub fn parse(entry: &str) -> Self {
        let Some(captures) = THREAD_PREFIX.captures(entry) else {
            return Self {
                url: entry.to_string(),
                threads: None,
            };
        };
        let prefix_len = captures.get(0).map_or(0, |m| m.end());
        let threads = captures
            .get(1)
            .map(|digits| digits.as_str().parse::<u32>().unwrap_or(THREAD_CEILING))
            .filter(|&n| n > 0)
            .map(clamp_threads);
        Self {
            url: entry[prefix_len..].to_string(),
            threads,
        }
    }

    /// Thread count to submit with: the override, or the `add-new` default.
    #[must_use]
    pub fn thread_count(&self) -> u32 {
        self.threads.unwrap_or(DEFAULT_LINK_THREADS)
    }
}

/// Splits a comma-separated `add-new` value into link requests.
///
/// Entries are trimmed and empty ones dropped. Entries whose URL repeats an
/// earlier one are dropped too; the first occurrence (and its thread count)
/// wins.
#[must_use]
pub fn parse_link_list(value: &str) -> Vec<LinkRequest> {
    let mut seen = HashSet::new();
    let mut requests = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let request = LinkRequest::parse(entry);
        if request.url.is_empty() {
            debug!(entry, "dropping entry with prefix but no URL");
            continue;
        }
        if seen.insert(request.url.clone()) {
            requests.push(request);
        } else {
            debug!(url = %request.url, "dropping duplicate entry");
        }
    }
    requests
}
