use chrono::{DateTime, SecondsFormat, Utc};

/// Window over transaction creation times, used for both upstream queries and cache reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub since: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl Pagination {
    /// Returns `None` when nothing is set, so callers take the unfiltered path.
    pub fn new(
        limit: Option<u32>,
        since: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        let limit = limit.filter(|l| *l != 0);

        if limit.is_none() && since.is_none() && before.is_none() {
            return None;
        }

        Some(Self {
            limit,
            since,
            before,
        })
    }

    /// Query parameters understood by the Monzo list endpoints
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(limit) = self.limit.filter(|l| *l != 0) {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(since) = self.since {
            pairs.push(("since", since.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
        }
        if let Some(before) = self.before {
            pairs.push(("before", before.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
        }

        pairs
    }

    /// Whether `created` falls strictly after `since` and strictly before `before`.
    /// An unset `before` means `now`.
    pub fn contains(&self, created: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let after_since = self.since.is_none_or(|since| created > since);
        let before = self.before.unwrap_or(now);

        after_since && created < before
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit.filter(|l| *l != 0).map(|l| l as usize)
    }
}
