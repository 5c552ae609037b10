use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::db::models::DailyStat;

/// Percentage change between two consecutive windows of daily stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GrowthRate {
    pub views_growth: i64,
    pub upvotes_growth: i64,
}

/// Summed views and upvotes over a set of daily rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub views: i64,
    pub upvotes: i64,
}

impl Totals {
    pub fn sum<'a, I>(stats: I) -> Self
    where
        I: IntoIterator<Item = &'a DailyStat>,
    {
        stats.into_iter().fold(Self::default(), |acc, s| Self {
            views: acc.views + s.views.max(0),
            upvotes: acc.upvotes + s.upvotes.max(0),
        })
    }
}

/// The two adjacent date windows compared by [`GrowthRate`].
///
/// `first` covers `[today - 2*len, today - len)`, `second` covers
/// `[today - len, today]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthWindows {
    pub first_start: NaiveDate,
    pub second_start: NaiveDate,
    pub today: NaiveDate,
}

impl GrowthWindows {
    pub fn ending(today: NaiveDate, window_days: i64) -> Self {
        Self {
            first_start: today - Duration::days(window_days * 2),
            second_start: today - Duration::days(window_days),
            today,
        }
    }

    pub fn in_first(&self, date: NaiveDate) -> bool {
        self.first_start <= date && date < self.second_start
    }

    pub fn in_second(&self, date: NaiveDate) -> bool {
        self.second_start <= date && date <= self.today
    }
}

impl GrowthRate {
    pub fn between(first: Totals, second: Totals) -> Self {
        Self {
            views_growth: percent_change(first.views, second.views),
            upvotes_growth: percent_change(first.upvotes, second.upvotes),
        }
    }

    /// Split rows into the two windows and compare them. Rows outside both
    /// windows are ignored.
    pub fn from_stats(stats: &[DailyStat], windows: &GrowthWindows) -> Self {
        let first = Totals::sum(stats.iter().filter(|s| windows.in_first(s.date)));
        let second = Totals::sum(stats.iter().filter(|s| windows.in_second(s.date)));
        Self::between(first, second)
    }
}

/// Rounded percentage change; zero when there is no baseline.
pub fn percent_change(before: i64, after: i64) -> i64 {
    if before <= 0 {
        return 0;
    }
    let change = (after - before) as f64 / before as f64 * 100.0;
    // Halves round up, so -2.5 becomes -2
    (change + 0.5).floor() as i64
}
