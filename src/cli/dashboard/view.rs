use chrono::NaiveDate;

use crate::{
    classify::Category,
    storage::entities::{DailySummary, TimeStore},
    utils::{
        percentage::{seconds_percentage, Percentage},
        time::day_key,
    },
};

pub const WEEK_DAYS: usize = 7;
pub const TOP_DOMAINS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: Category,
    pub seconds: u64,
    pub percentage: Percentage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRow {
    pub domain: String,
    pub seconds: u64,
    pub category: Category,
}

/// Everything the dashboard shows, derived from a [TimeStore] without touching it.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub today: String,
    pub weekly: Vec<DailySummary>,
    pub today_shares: Vec<CategoryShare>,
    pub top_domains: Vec<DomainRow>,
}

impl DashboardView {
    pub fn build(store: &TimeStore, today: NaiveDate) -> Self {
        let today_key = day_key(today);

        let mut weekly = store.recent_summaries(WEEK_DAYS);
        if weekly.is_empty() {
            weekly.push(DailySummary::zero(today_key.clone()));
        }

        let today_data = store.day(today);

        // Percentages are relative to all tracked time, neutral included.
        let today_total = today_data.map_or(0, |day| day.total_seconds());
        let today_shares = Category::ALL
            .into_iter()
            .map(|category| {
                let seconds = today_data.map_or(0, |day| day.seconds_for(category));
                CategoryShare {
                    category,
                    seconds,
                    percentage: seconds_percentage(seconds, today_total),
                }
            })
            .collect();

        let top_domains = today_data
            .map(|day| {
                day.top_domains(TOP_DOMAINS)
                    .into_iter()
                    .map(|(domain, record)| DomainRow {
                        domain: domain.to_string(),
                        seconds: record.total_seconds,
                        category: record.category,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            today: today_key,
            weekly,
            today_shares,
            top_domains,
        }
    }
}
