use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest habit name the tracker accepts; enforced again at import time.
pub const MAX_HABIT_NAME_LEN: usize = 25;

/// One tracked habit's per-day completion data for a month.
/// `days` holds one 0/1 entry per calendar day, in day order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitRecord {
    pub id: Uuid,
    pub name: String,
    pub days: Vec<u8>,
}

impl HabitRecord {
    pub fn total(&self) -> u32 {
        self.days.iter().map(|&d| u32::from(d)).sum()
    }
}

/// A month's worth of habit data, as fetched from storage or supplied
/// as a JSON payload. Habits keep the order the user created them in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthData {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub habits: Vec<HabitRecord>,
}

/// Aggregated completions for one calendar week of the month.
/// The last week of a month may cover fewer than 7 days.
#[derive(Debug, Clone, Serialize)]
pub struct WeekBucket {
    /// 1-based week number within the month.
    pub week: u32,
    /// 1-based day-of-month bounds, inclusive.
    pub start_day: u32,
    pub end_day: u32,
    pub days_in_week: u32,
    pub total_completions: u32,
    pub per_habit: HashMap<Uuid, u32>,
    /// Percent of possible completions in this week, one decimal.
    pub completion_percent: f64,
}

/// Cross-week comparison of one weekday position. `per_week[w]` is the
/// number of habits completed on week w+1's day `day_of_week`, or `None`
/// when that calendar day does not exist (short final week). Absent is
/// not zero: the charts render a gap, not a zero point.
#[derive(Debug, Clone, Serialize)]
pub struct DayOfWeekRow {
    pub day_of_week: u32,
    pub per_week: Vec<Option<u32>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitSummary {
    pub id: Uuid,
    pub name: String,
    pub total: u32,
    pub percent_complete: f64,
}

/// Per-habit average completions per week, two decimals.
#[derive(Debug, Clone, Serialize)]
pub struct HabitWeeklyAverage {
    pub id: Uuid,
    pub name: String,
    pub total: u32,
    pub average_per_week: f64,
}

/// The monthly metrics payload the dashboard consumes.
#[derive(Debug, Clone, Serialize)]
pub struct MonthMetrics {
    pub days_in_month: u32,
    pub habit_summaries: Vec<HabitSummary>,
    pub total_completed_days: u32,
    pub total_possible_days: u32,
    pub overall_completion_percent: f64,
    /// Count of habits completed on each calendar day, day 1 first.
    pub daily_scores: Vec<u32>,
}
