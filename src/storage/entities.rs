use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    classify::Category,
    utils::time::{day_key, parse_day_key},
};

/// Time spent on one domain during one day. The domain itself is the key inside
/// [DayAggregate::domains].
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct DomainRecord {
    #[serde(rename = "time", default, deserialize_with = "null_as_zero")]
    pub total_seconds: u64,
    #[serde(rename = "productive", with = "category_flag", default = "neutral")]
    pub category: Category,
}

fn neutral() -> Category {
    Category::Neutral
}

/// Totals written as `null` read as 0.
fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

mod category_flag {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::classify::Category;

    pub fn serialize<S>(category: &Category, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        category.as_flag().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Category, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Category::from_flag(Option::<bool>::deserialize(deserializer)?))
    }
}

/// Per-category and per-domain totals of a single day.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DayAggregate {
    #[serde(rename = "productive", deserialize_with = "null_as_zero")]
    pub productive_seconds: u64,
    #[serde(rename = "unproductive", deserialize_with = "null_as_zero")]
    pub unproductive_seconds: u64,
    #[serde(rename = "neutral", deserialize_with = "null_as_zero")]
    pub neutral_seconds: u64,
    pub domains: BTreeMap<String, DomainRecord>,
}

impl DayAggregate {
    pub fn seconds_for(&self, category: Category) -> u64 {
        match category {
            Category::Productive => self.productive_seconds,
            Category::Unproductive => self.unproductive_seconds,
            Category::Neutral => self.neutral_seconds,
        }
    }

    fn seconds_for_mut(&mut self, category: Category) -> &mut u64 {
        match category {
            Category::Productive => &mut self.productive_seconds,
            Category::Unproductive => &mut self.unproductive_seconds,
            Category::Neutral => &mut self.neutral_seconds,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.productive_seconds + self.unproductive_seconds + self.neutral_seconds
    }

    /// Adds time to the category total and to the domain. A domain keeps the category it was
    /// first seen with for the rest of the day.
    pub fn add(&mut self, domain: &str, seconds: u64, category: Category) {
        *self.seconds_for_mut(category) += seconds;
        let record = self
            .domains
            .entry(domain.to_string())
            .or_insert_with(|| DomainRecord {
                total_seconds: 0,
                category,
            });
        record.total_seconds += seconds;
    }

    /// Domains ordered by time spent, longest first.
    pub fn top_domains(&self, limit: usize) -> Vec<(&str, &DomainRecord)> {
        let mut domains = self
            .domains
            .iter()
            .map(|(domain, record)| (domain.as_str(), record))
            .collect::<Vec<_>>();
        domains.sort_by(|a, b| b.1.total_seconds.cmp(&a.1.total_seconds));
        domains.truncate(limit);
        domains
    }
}

/// Category totals of one day, as shown in weekly charts and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: String,
    pub productive: u64,
    pub unproductive: u64,
    pub neutral: u64,
}

impl DailySummary {
    pub fn zero(date: String) -> Self {
        Self {
            date,
            productive: 0,
            unproductive: 0,
            neutral: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.productive + self.unproductive + self.neutral
    }
}

/// Every recorded day, keyed by its ISO date. Ordering of the map is the lexical ordering of
/// the keys, which for ISO dates is also the calendar ordering.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
#[serde(transparent)]
pub struct TimeStore(pub BTreeMap<String, DayAggregate>);

impl TimeStore {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayAggregate> {
        self.0.get(&day_key(date))
    }

    pub fn day_mut(&mut self, date: NaiveDate) -> &mut DayAggregate {
        self.0.entry(day_key(date)).or_default()
    }

    pub fn record(&mut self, date: NaiveDate, domain: &str, seconds: u64, category: Category) {
        if seconds == 0 {
            return;
        }
        self.day_mut(date).add(domain, seconds, category);
    }

    /// Shallow overlay: every day present in `other` replaces the stored day as a whole.
    pub fn overlay(&mut self, other: TimeStore) {
        self.0.extend(other.0);
    }

    /// The `count` most recent days in ascending order.
    pub fn last_days(&self, count: usize) -> impl Iterator<Item = (&str, &DayAggregate)> {
        let skip = self.0.len().saturating_sub(count);
        self.0
            .iter()
            .skip(skip)
            .map(|(date, day)| (date.as_str(), day))
    }

    /// Summaries of the `count` most recent days, oldest first.
    pub fn recent_summaries(&self, count: usize) -> Vec<DailySummary> {
        self.last_days(count)
            .map(|(date, day)| DailySummary {
                date: date.to_string(),
                productive: day.productive_seconds,
                unproductive: day.unproductive_seconds,
                neutral: day.neutral_seconds,
            })
            .collect()
    }

    /// Drops days older than `retain_days` days counted back from `today` (inclusive).
    /// Keys that aren't dates are left alone. Returns how many days were removed.
    pub fn prune(&mut self, today: NaiveDate, retain_days: u32) -> usize {
        // A window reaching past the calendar keeps everything.
        let Some(oldest_kept) = Duration::try_days(i64::from(retain_days.max(1)) - 1)
            .and_then(|window| today.checked_sub_signed(window))
        else {
            return 0;
        };
        let before = self.0.len();
        self.0
            .retain(|key, _| parse_day_key(key).map_or(true, |date| date >= oldest_kept));
        before - self.0.len()
    }
}
