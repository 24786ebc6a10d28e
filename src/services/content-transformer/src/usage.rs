//! Daily free-use counter for anonymous sessions
//!
//! The serialized form is the date-keyed object browsers keep in local
//! storage, e.g. `{"Mon May 06 2024": 3}`. Only today's entry counts, so a
//! date rollover resets usage without any cleanup. This is a courtesy limit,
//! not an access control.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DAILY_LIMIT: u32 = 5;

/// Same shape as `Date.prototype.toDateString`
pub fn date_key(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyUsage {
    counts: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub date: String,
    pub used: u32,
    pub remaining: u32,
    pub limit: u32,
}

impl DailyUsage {
    pub fn used(&self, today: NaiveDate) -> u32 {
        self.counts.get(&date_key(today)).copied().unwrap_or(0)
    }

    pub fn remaining(&self, today: NaiveDate, limit: u32) -> u32 {
        limit.saturating_sub(self.used(today))
    }

    pub fn can_use(&self, today: NaiveDate, limit: u32) -> bool {
        self.remaining(today, limit) > 0
    }

    /// Records one use and drops entries for other dates
    pub fn increment(&mut self, today: NaiveDate) -> u32 {
        let key = date_key(today);
        let count = self.counts.get(&key).copied().unwrap_or(0).saturating_add(1);
        self.counts.clear();
        self.counts.insert(key, count);
        count
    }

    pub fn snapshot(&self, today: NaiveDate, limit: u32) -> UsageSnapshot {
        UsageSnapshot {
            date: date_key(today),
            used: self.used(today),
            remaining: self.remaining(today, limit),
            limit,
        }
    }
}
