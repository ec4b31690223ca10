use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{self, InvalidInput};
use crate::models::{MonthData, WeekBucket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Line,
    Area,
    Doughnut,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub label: String,
    /// One value per x-axis label. `None` is a gap (absent calendar day),
    /// serialized as JSON null so the renderer breaks the series there.
    pub data: Vec<Option<f64>>,
    pub tooltips: Vec<String>,
}

/// A render-ready chart: labels, series, and precomputed tooltip text.
/// Carries no handles to any rendering engine.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_label: Option<String>,
}

/// Tooltip text for one data point of one series.
pub trait TooltipFormat {
    fn point(&self, series: usize, index: usize) -> String;
}

/// Owns the active chart slots. Replaces the old ambient chart-handle
/// globals: the caller decides when a slot is replaced or disposed.
#[derive(Debug, Default)]
pub struct ChartRegistry {
    slots: BTreeMap<String, ChartSpec>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a chart in a slot, returning the spec it displaced.
    pub fn replace(&mut self, slot: &str, spec: ChartSpec) -> Option<ChartSpec> {
        self.slots.insert(slot.to_string(), spec)
    }

    pub fn dispose(&mut self, slot: &str) -> Option<ChartSpec> {
        self.slots.remove(slot)
    }

    pub fn get(&self, slot: &str) -> Option<&ChartSpec> {
        self.slots.get(slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.slots)
    }
}

/// Chart labels get tight; long habit names are cut with an ellipsis.
fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let cut: String = name.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

fn week_label(bucket: &WeekBucket) -> String {
    format!("Week {}", bucket.week)
}

struct WeekRangeTooltip<'a> {
    buckets: &'a [WeekBucket],
    habit_count: usize,
}

impl TooltipFormat for WeekRangeTooltip<'_> {
    fn point(&self, _series: usize, index: usize) -> String {
        let b = &self.buckets[index];
        format!(
            "Week {} (Days {}-{}): {} of {} completions ({}%)",
            b.week,
            b.start_day,
            b.end_day,
            b.total_completions,
            self.habit_count as u32 * b.days_in_week,
            b.completion_percent
        )
    }
}

struct DayOfWeekTooltip<'a> {
    rows: &'a [crate::models::DayOfWeekRow],
    habit_count: usize,
}

impl TooltipFormat for DayOfWeekTooltip<'_> {
    fn point(&self, series: usize, index: usize) -> String {
        let week = series + 1;
        match self.rows[index].per_week[series] {
            Some(score) if self.habit_count > 0 => {
                let percent = f64::from(score) / self.habit_count as f64 * 100.0;
                format!(
                    "Week {week}: {score} of {} habits ({percent:.1}%)",
                    self.habit_count
                )
            }
            Some(score) => format!("Week {week}: {score} habits"),
            None => format!("Week {week}: No data"),
        }
    }
}

fn fill_tooltips(fmt: &dyn TooltipFormat, series: usize, points: usize) -> Vec<String> {
    (0..points).map(|index| fmt.point(series, index)).collect()
}

/// Build every dashboard chart for one month of habit data.
pub fn build_all(data: &MonthData) -> Result<ChartRegistry, InvalidInput> {
    let metrics = aggregate::month_metrics(data)?;
    let buckets = aggregate::week_buckets(data)?;
    let dow_rows = aggregate::day_of_week_rows(data)?;
    let averages = aggregate::top_by_weekly_average(data, &buckets);
    let habit_count = data.habits.len();

    let mut registry = ChartRegistry::new();

    // Monthly totals per habit, in dashboard (sorted) order.
    registry.replace(
        "completion_bar",
        ChartSpec {
            kind: ChartKind::Bar,
            title: "Habit Completions".to_string(),
            labels: metrics
                .habit_summaries
                .iter()
                .map(|s| truncate(&s.name, 15))
                .collect(),
            datasets: vec![Dataset {
                label: "Total Completions".to_string(),
                data: metrics
                    .habit_summaries
                    .iter()
                    .map(|s| Some(f64::from(s.total)))
                    .collect(),
                tooltips: metrics
                    .habit_summaries
                    .iter()
                    .map(|s| {
                        format!(
                            "{}: {} / {} days ({}%)",
                            s.name, s.total, metrics.days_in_month, s.percent_complete
                        )
                    })
                    .collect(),
            }],
            center_label: None,
        },
    );

    let remaining = metrics.total_possible_days - metrics.total_completed_days;
    registry.replace(
        "completion_donut",
        ChartSpec {
            kind: ChartKind::Doughnut,
            title: "Completed vs Remaining".to_string(),
            labels: vec!["Completed".to_string(), "Remaining".to_string()],
            datasets: vec![Dataset {
                label: "Days".to_string(),
                data: vec![
                    Some(f64::from(metrics.total_completed_days)),
                    Some(f64::from(remaining)),
                ],
                tooltips: vec![
                    format!("Completed: {} days", metrics.total_completed_days),
                    format!("Remaining: {remaining} days"),
                ],
            }],
            center_label: Some(format!("{}%", metrics.overall_completion_percent)),
        },
    );

    registry.replace(
        "daily_trend",
        ChartSpec {
            kind: ChartKind::Line,
            title: "Daily Completion Trend".to_string(),
            labels: (1..=metrics.days_in_month).map(|d| d.to_string()).collect(),
            datasets: vec![Dataset {
                label: "Habits Completed".to_string(),
                data: metrics
                    .daily_scores
                    .iter()
                    .map(|&s| Some(f64::from(s)))
                    .collect(),
                tooltips: metrics
                    .daily_scores
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| format!("Day {}: {s} of {habit_count} habits", i + 1))
                    .collect(),
            }],
            center_label: None,
        },
    );

    registry.replace(
        "top_percent_bar",
        ChartSpec {
            kind: ChartKind::HorizontalBar,
            title: "Top Habits by Completion Rate".to_string(),
            labels: metrics
                .habit_summaries
                .iter()
                .map(|s| truncate(&s.name, 20))
                .collect(),
            datasets: vec![Dataset {
                label: "Completion %".to_string(),
                data: metrics
                    .habit_summaries
                    .iter()
                    .map(|s| Some(s.percent_complete))
                    .collect(),
                tooltips: metrics
                    .habit_summaries
                    .iter()
                    .map(|s| {
                        format!(
                            "{}: {}% ({} / {} days)",
                            s.name, s.percent_complete, s.total, metrics.days_in_month
                        )
                    })
                    .collect(),
            }],
            center_label: None,
        },
    );

    let week_fmt = WeekRangeTooltip {
        buckets: &buckets,
        habit_count,
    };
    let week_labels: Vec<String> = buckets.iter().map(week_label).collect();

    registry.replace(
        "weekly_totals",
        ChartSpec {
            kind: ChartKind::Bar,
            title: "Weekly Completion Trend".to_string(),
            labels: week_labels.clone(),
            datasets: vec![Dataset {
                label: "Total Completions".to_string(),
                data: buckets
                    .iter()
                    .map(|b| Some(f64::from(b.total_completions)))
                    .collect(),
                tooltips: fill_tooltips(&week_fmt, 0, buckets.len()),
            }],
            center_label: None,
        },
    );

    registry.replace(
        "weekly_percent",
        ChartSpec {
            kind: ChartKind::Area,
            title: "Weekly Completion Percentage".to_string(),
            labels: week_labels.clone(),
            datasets: vec![Dataset {
                label: "Completion %".to_string(),
                data: buckets
                    .iter()
                    .map(|b| Some(b.completion_percent))
                    .collect(),
                tooltips: fill_tooltips(&week_fmt, 0, buckets.len()),
            }],
            center_label: None,
        },
    );

    // One series per habit across the weeks.
    registry.replace(
        "weekly_comparison",
        ChartSpec {
            kind: ChartKind::Bar,
            title: "Weekly Habit Comparison".to_string(),
            labels: week_labels,
            datasets: data
                .habits
                .iter()
                .map(|habit| Dataset {
                    label: truncate(&habit.name, 15),
                    data: buckets
                        .iter()
                        .map(|b| {
                            Some(f64::from(
                                b.per_habit.get(&habit.id).copied().unwrap_or(0),
                            ))
                        })
                        .collect(),
                    tooltips: buckets
                        .iter()
                        .map(|b| {
                            format!(
                                "{}: {}/{} days",
                                habit.name,
                                b.per_habit.get(&habit.id).copied().unwrap_or(0),
                                b.days_in_week
                            )
                        })
                        .collect(),
                })
                .collect(),
            center_label: None,
        },
    );

    registry.replace(
        "weekly_average",
        ChartSpec {
            kind: ChartKind::HorizontalBar,
            title: "Top Habits by Weekly Average".to_string(),
            labels: averages.iter().map(|a| truncate(&a.name, 20)).collect(),
            datasets: vec![Dataset {
                label: "Avg Weekly Completions".to_string(),
                data: averages.iter().map(|a| Some(a.average_per_week)).collect(),
                tooltips: averages
                    .iter()
                    .map(|a| {
                        format!(
                            "{}: {:.2} days per week ({} total)",
                            a.name, a.average_per_week, a.total
                        )
                    })
                    .collect(),
            }],
            center_label: None,
        },
    );

    // Day-of-week views: one series per week, gaps where the short
    // final week has no such day.
    let dow_fmt = DayOfWeekTooltip {
        rows: &dow_rows,
        habit_count,
    };
    let dow_labels: Vec<String> = (1..=7).map(|d| format!("Day {d}")).collect();
    let num_weeks = buckets.len();

    let dow_datasets = || -> Vec<Dataset> {
        (0..num_weeks)
            .map(|series| Dataset {
                label: format!("Week {}", series + 1),
                data: dow_rows
                    .iter()
                    .map(|row| row.per_week[series].map(f64::from))
                    .collect(),
                tooltips: fill_tooltips(&dow_fmt, series, 7),
            })
            .collect()
    };

    registry.replace(
        "day_of_week_lines",
        ChartSpec {
            kind: ChartKind::Line,
            title: "Weekly Scores by Day of Week".to_string(),
            labels: dow_labels.clone(),
            datasets: dow_datasets(),
            center_label: None,
        },
    );

    registry.replace(
        "day_of_week_bars",
        ChartSpec {
            kind: ChartKind::Bar,
            title: "Weekly Scores by Day of Week".to_string(),
            labels: dow_labels,
            datasets: dow_datasets(),
            center_label: None,
        },
    );

    Ok(registry)
}
