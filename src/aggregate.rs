use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    DayOfWeekRow, HabitSummary, HabitWeeklyAverage, MonthData, MonthMetrics, WeekBucket,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("days_in_month must be between 28 and 31, got {0}")]
    MonthLength(u32),

    #[error("habit {id} has {len} day entries, expected {expected}")]
    DayCountMismatch { id: Uuid, len: usize, expected: u32 },
}

/// 1-based day-of-month bounds of a week, inclusive. The final week of
/// a month is clamped and may span fewer than 7 days.
pub fn week_bounds(week: u32, days_in_month: u32) -> (u32, u32) {
    let start = (week - 1) * 7 + 1;
    let end = (week * 7).min(days_in_month);
    (start, end)
}

pub fn num_weeks(days_in_month: u32) -> u32 {
    days_in_month.div_ceil(7)
}

/// Percentages round to one decimal, ties away from zero.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn validate(data: &MonthData) -> Result<(), InvalidInput> {
    if !(28..=31).contains(&data.days_in_month) {
        return Err(InvalidInput::MonthLength(data.days_in_month));
    }
    for habit in &data.habits {
        if habit.days.len() != data.days_in_month as usize {
            return Err(InvalidInput::DayCountMismatch {
                id: habit.id,
                len: habit.days.len(),
                expected: data.days_in_month,
            });
        }
    }
    Ok(())
}

/// Split the month into calendar weeks and sum completions per week.
/// Weeks cover every day exactly once; a short final week uses its true
/// day count as the percentage denominator, never 7.
pub fn week_buckets(data: &MonthData) -> Result<Vec<WeekBucket>, InvalidInput> {
    validate(data)?;

    let mut buckets = Vec::new();
    for week in 1..=num_weeks(data.days_in_month) {
        let (start_day, end_day) = week_bounds(week, data.days_in_month);
        let days_in_week = end_day - start_day + 1;

        let mut per_habit: HashMap<Uuid, u32> = HashMap::new();
        let mut total_completions = 0u32;

        for habit in &data.habits {
            let week_completions = habit.days[(start_day - 1) as usize..end_day as usize]
                .iter()
                .map(|&d| u32::from(d))
                .sum::<u32>();
            total_completions += week_completions;
            per_habit.insert(habit.id, week_completions);
        }

        let possible = data.habits.len() as u32 * days_in_week;
        let completion_percent = if possible == 0 {
            0.0
        } else {
            round1(f64::from(total_completions) / f64::from(possible) * 100.0)
        };

        buckets.push(WeekBucket {
            week,
            start_day,
            end_day,
            days_in_week,
            total_completions,
            per_habit,
            completion_percent,
        });
    }

    Ok(buckets)
}

/// Count of habits completed on each calendar day, day 1 first.
pub fn daily_scores(data: &MonthData) -> Vec<u32> {
    let mut scores = vec![0u32; data.days_in_month as usize];
    for habit in &data.habits {
        for (index, &done) in habit.days.iter().enumerate() {
            scores[index] += u32::from(done);
        }
    }
    scores
}

/// Compare the same weekday position across all weeks of the month.
/// Always returns exactly 7 rows; a (day, week) pair whose calendar day
/// falls past the end of the month is `None`, not zero.
pub fn day_of_week_rows(data: &MonthData) -> Result<Vec<DayOfWeekRow>, InvalidInput> {
    validate(data)?;

    let scores = daily_scores(data);
    let weeks = num_weeks(data.days_in_month);

    let mut rows = Vec::with_capacity(7);
    for day_of_week in 1..=7u32 {
        let mut per_week = Vec::with_capacity(weeks as usize);
        for week in 1..=weeks {
            let (start_day, end_day) = week_bounds(week, data.days_in_month);
            let calendar_day = start_day + day_of_week - 1;
            if calendar_day <= end_day && calendar_day <= data.days_in_month {
                per_week.push(Some(scores[(calendar_day - 1) as usize]));
            } else {
                per_week.push(None);
            }
        }
        rows.push(DayOfWeekRow {
            day_of_week,
            per_week,
        });
    }

    Ok(rows)
}

fn summarize(data: &MonthData) -> Vec<HabitSummary> {
    data.habits
        .iter()
        .map(|habit| {
            let total = habit.total();
            HabitSummary {
                id: habit.id,
                name: habit.name.clone(),
                total,
                percent_complete: round1(
                    f64::from(total) / f64::from(data.days_in_month) * 100.0,
                ),
            }
        })
        .collect()
}

/// Habit summaries sorted by percent complete, best first. The sort is
/// stable so habits with equal percentages keep their original order.
pub fn top_by_percent(data: &MonthData) -> Result<Vec<HabitSummary>, InvalidInput> {
    validate(data)?;

    let mut summaries = summarize(data);
    summaries.sort_by(|a, b| {
        b.percent_complete
            .partial_cmp(&a.percent_complete)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(summaries)
}

/// Average completions per week for each habit, best first, stable ties.
pub fn top_by_weekly_average(
    data: &MonthData,
    buckets: &[WeekBucket],
) -> Vec<HabitWeeklyAverage> {
    let weeks = buckets.len() as u32;

    let mut averages: Vec<HabitWeeklyAverage> = data
        .habits
        .iter()
        .map(|habit| {
            let weekly_total: u32 = buckets
                .iter()
                .map(|bucket| bucket.per_habit.get(&habit.id).copied().unwrap_or(0))
                .sum();
            let average_per_week = if weeks == 0 {
                0.0
            } else {
                round2(f64::from(weekly_total) / f64::from(weeks))
            };
            HabitWeeklyAverage {
                id: habit.id,
                name: habit.name.clone(),
                total: habit.total(),
                average_per_week,
            }
        })
        .collect();

    averages.sort_by(|a, b| {
        b.average_per_week
            .partial_cmp(&a.average_per_week)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    averages
}

/// The monthly metrics payload: per-habit summaries sorted best first,
/// overall totals, and the per-day completion trend.
pub fn month_metrics(data: &MonthData) -> Result<MonthMetrics, InvalidInput> {
    let habit_summaries = top_by_percent(data)?;

    let total_completed_days: u32 = habit_summaries.iter().map(|s| s.total).sum();
    let total_possible_days = data.habits.len() as u32 * data.days_in_month;
    let overall_completion_percent = if total_possible_days == 0 {
        0.0
    } else {
        round1(f64::from(total_completed_days) / f64::from(total_possible_days) * 100.0)
    };

    Ok(MonthMetrics {
        days_in_month: data.days_in_month,
        habit_summaries,
        total_completed_days,
        total_possible_days,
        overall_completion_percent,
        daily_scores: daily_scores(data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HabitRecord;

    fn habit(name: &str, days: Vec<u8>) -> HabitRecord {
        HabitRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            days,
        }
    }

    fn month(days_in_month: u32, habits: Vec<HabitRecord>) -> MonthData {
        MonthData {
            year: 2026,
            month: 6,
            days_in_month,
            habits,
        }
    }

    #[test]
    fn weeks_partition_every_month_length() {
        for days_in_month in 28..=31 {
            let data = month(days_in_month, vec![habit("Read", vec![0; days_in_month as usize])]);
            let buckets = week_buckets(&data).unwrap();

            assert_eq!(buckets.len() as u32, num_weeks(days_in_month));
            let covered: u32 = buckets.iter().map(|b| b.days_in_week).sum();
            assert_eq!(covered, days_in_month);

            for pair in buckets.windows(2) {
                assert_eq!(pair[1].start_day, pair[0].end_day + 1);
            }
            assert_eq!(buckets[0].start_day, 1);
            assert_eq!(buckets.last().unwrap().end_day, days_in_month);
        }
    }

    #[test]
    fn percent_stays_in_range() {
        let data = month(
            31,
            vec![
                habit("Gym", vec![1; 31]),
                habit("Read", vec![0; 31]),
                habit(
                    "Walk",
                    (0..31).map(|d| u8::from(d % 2 == 0)).collect(),
                ),
            ],
        );
        for bucket in week_buckets(&data).unwrap() {
            assert!(bucket.completion_percent >= 0.0);
            assert!(bucket.completion_percent <= 100.0);
        }
    }

    #[test]
    fn four_full_weeks_of_perfect_completion() {
        let data = month(28, vec![habit("Meditate", vec![1; 28])]);
        let buckets = week_buckets(&data).unwrap();

        assert_eq!(buckets.len(), 4);
        for bucket in &buckets {
            assert_eq!(bucket.days_in_week, 7);
            assert_eq!(bucket.total_completions, 7);
            assert_eq!(bucket.completion_percent, 100.0);
        }
    }

    #[test]
    fn empty_habits_give_zero_percent_not_nan() {
        let data = month(30, vec![]);
        let buckets = week_buckets(&data).unwrap();
        for bucket in &buckets {
            assert_eq!(bucket.total_completions, 0);
            assert_eq!(bucket.completion_percent, 0.0);
        }
    }

    #[test]
    fn idle_habits_give_zero_everywhere() {
        let habits = (0..5)
            .map(|i| habit(&format!("Habit {i}"), vec![0; 31]))
            .collect();
        let data = month(31, habits);
        for bucket in week_buckets(&data).unwrap() {
            assert_eq!(bucket.total_completions, 0);
            assert_eq!(bucket.completion_percent, 0.0);
            assert!(bucket.per_habit.values().all(|&c| c == 0));
        }
    }

    #[test]
    fn short_final_week_uses_its_own_denominator() {
        // Days 29 and 30 completed; week 5 has only those two days.
        let mut days = vec![0; 30];
        days[28] = 1;
        days[29] = 1;
        let data = month(30, vec![habit("Journal", days)]);
        let buckets = week_buckets(&data).unwrap();

        let last = buckets.last().unwrap();
        assert_eq!(last.week, 5);
        assert_eq!(last.days_in_week, 2);
        assert_eq!(last.total_completions, 2);
        assert_eq!(last.completion_percent, 100.0);
    }

    #[test]
    fn rejects_out_of_range_month_length() {
        let data = month(27, vec![]);
        assert_eq!(
            week_buckets(&data).unwrap_err(),
            InvalidInput::MonthLength(27)
        );
        let data = month(32, vec![]);
        assert!(day_of_week_rows(&data).is_err());
    }

    #[test]
    fn rejects_mismatched_day_arrays() {
        let short = habit("Stretch", vec![1; 29]);
        let id = short.id;
        let data = month(30, vec![short]);
        assert_eq!(
            week_buckets(&data).unwrap_err(),
            InvalidInput::DayCountMismatch {
                id,
                len: 29,
                expected: 30
            }
        );
    }

    #[test]
    fn day_of_week_marks_missing_days_absent() {
        let data = month(30, vec![habit("Run", vec![1; 30])]);
        let rows = day_of_week_rows(&data).unwrap();

        assert_eq!(rows.len(), 7);
        // 30 days: week 5 covers days 29-30 only.
        let day1 = &rows[0];
        let day2 = &rows[1];
        let day3 = &rows[2];
        assert_eq!(day1.per_week[4], Some(1));
        assert_eq!(day2.per_week[4], Some(1));
        assert_eq!(day3.per_week[4], None);
        for row in &rows[2..] {
            assert_eq!(row.per_week[4], None);
        }
    }

    #[test]
    fn absent_is_distinct_from_zero() {
        // Nothing completed: existing days score Some(0), missing days None.
        let data = month(29, vec![habit("Write", vec![0; 29])]);
        let rows = day_of_week_rows(&data).unwrap();

        // 29 days: week 5 is day 29 only.
        assert_eq!(rows[0].per_week[4], Some(0));
        assert_eq!(rows[1].per_week[4], None);
    }

    #[test]
    fn day_of_week_counts_habits_per_calendar_day() {
        // Day 1: both habits. Day 8 (week 2, day-of-week 1): one habit.
        let mut a = vec![0; 28];
        a[0] = 1;
        a[7] = 1;
        let mut b = vec![0; 28];
        b[0] = 1;
        let data = month(28, vec![habit("A", a), habit("B", b)]);
        let rows = day_of_week_rows(&data).unwrap();

        assert_eq!(rows[0].per_week, vec![Some(2), Some(1), Some(0), Some(0)]);
    }

    #[test]
    fn percent_sort_is_stable_on_ties() {
        let first = habit("First", vec![1; 30]);
        let second = habit("Second", vec![1; 30]);
        let slacker = habit("Slacker", vec![0; 30]);
        let data = month(30, vec![first.clone(), slacker, second.clone()]);

        let sorted = top_by_percent(&data).unwrap();
        assert_eq!(sorted[0].id, first.id);
        assert_eq!(sorted[1].id, second.id);
        assert_eq!(sorted[2].name, "Slacker");
    }

    #[test]
    fn weekly_average_rounds_to_two_decimals() {
        // 10 completions across 5 weeks: exactly 2.00 per week.
        let mut days = vec![0; 31];
        for day in days.iter_mut().take(10) {
            *day = 1;
        }
        let data = month(31, vec![habit("Yoga", days)]);
        let buckets = week_buckets(&data).unwrap();
        let averages = top_by_weekly_average(&data, &buckets);

        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].average_per_week, 2.0);
        assert_eq!(averages[0].total, 10);
    }

    #[test]
    fn weekly_average_sort_descends_with_stable_ties() {
        let strong = habit("Strong", vec![1; 28]);
        let tied_a = habit("Tied A", {
            let mut d = vec![0; 28];
            d[0] = 1;
            d
        });
        let tied_b = habit("Tied B", {
            let mut d = vec![0; 28];
            d[14] = 1;
            d
        });
        let data = month(28, vec![tied_a.clone(), strong.clone(), tied_b.clone()]);

        let buckets = week_buckets(&data).unwrap();
        let averages = top_by_weekly_average(&data, &buckets);
        assert_eq!(averages[0].id, strong.id);
        assert_eq!(averages[1].id, tied_a.id);
        assert_eq!(averages[2].id, tied_b.id);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        // Exact binary halves, so the tie-break itself is what's tested.
        assert_eq!(round1(6.25), 6.3);
        assert_eq!(round1(-6.25), -6.3);
        assert_eq!(round2(0.125), 0.13);
    }

    #[test]
    fn month_metrics_totals_and_overall_percent() {
        let data = month(30, vec![habit("Gym", vec![1; 30]), habit("Read", vec![0; 30])]);
        let metrics = month_metrics(&data).unwrap();

        assert_eq!(metrics.total_completed_days, 30);
        assert_eq!(metrics.total_possible_days, 60);
        assert_eq!(metrics.overall_completion_percent, 50.0);
        assert_eq!(metrics.habit_summaries[0].name, "Gym");
        assert_eq!(metrics.habit_summaries[0].percent_complete, 100.0);
        assert_eq!(metrics.daily_scores, vec![1; 30]);
    }

    #[test]
    fn month_metrics_with_no_habits_is_all_zero() {
        let metrics = month_metrics(&month(31, vec![])).unwrap();
        assert_eq!(metrics.total_possible_days, 0);
        assert_eq!(metrics.overall_completion_percent, 0.0);
        assert!(metrics.habit_summaries.is_empty());
    }
}
