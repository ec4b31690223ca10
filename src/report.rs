use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate::{self, InvalidInput};
use crate::models::MonthData;

pub fn month_label(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.format("%B %Y").to_string(),
        None => format!("{year}-{month:02}"),
    }
}

pub fn build_report(data: &MonthData) -> Result<String, InvalidInput> {
    let metrics = aggregate::month_metrics(data)?;
    let buckets = aggregate::week_buckets(data)?;
    let dow_rows = aggregate::day_of_week_rows(data)?;
    let averages = aggregate::top_by_weekly_average(data, &buckets);

    let mut output = String::new();

    let _ = writeln!(output, "# TaskTraQ Habit Report");
    let _ = writeln!(output, "Month: {}", month_label(data.year, data.month));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");

    if data.habits.is_empty() {
        let _ = writeln!(output, "No habits tracked this month.");
    } else {
        let _ = writeln!(
            output,
            "- {} habits tracked over {} days",
            data.habits.len(),
            metrics.days_in_month
        );
        let _ = writeln!(
            output,
            "- {} of {} possible completions ({}%)",
            metrics.total_completed_days,
            metrics.total_possible_days,
            metrics.overall_completion_percent
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Breakdown");

    for bucket in &buckets {
        let _ = writeln!(
            output,
            "- Week {} (days {}-{}): {} completions, {}%",
            bucket.week,
            bucket.start_day,
            bucket.end_day,
            bucket.total_completions,
            bucket.completion_percent
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Day-of-Week Scores");
    let _ = writeln!(
        output,
        "Habits completed on each weekday position; a dash means the"
    );
    let _ = writeln!(output, "final short week has no such day.");
    let _ = writeln!(output);

    let mut header = String::from("| Day |");
    let mut rule = String::from("| --- |");
    for bucket in &buckets {
        let _ = write!(header, " Week {} |", bucket.week);
        rule.push_str(" --- |");
    }
    let _ = writeln!(output, "{header}");
    let _ = writeln!(output, "{rule}");

    for row in &dow_rows {
        let _ = write!(output, "| {} |", row.day_of_week);
        for score in &row.per_week {
            match score {
                Some(value) => {
                    let _ = write!(output, " {value} |");
                }
                None => {
                    let _ = write!(output, " — |");
                }
            }
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Habits by Completion Rate");

    if metrics.habit_summaries.is_empty() {
        let _ = writeln!(output, "No habits tracked this month.");
    } else {
        for summary in metrics.habit_summaries.iter().take(10) {
            let _ = writeln!(
                output,
                "- {}: {} / {} days ({}%)",
                summary.name, summary.total, metrics.days_in_month, summary.percent_complete
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Averages");

    if averages.is_empty() {
        let _ = writeln!(output, "No habits tracked this month.");
    } else {
        for average in averages.iter().take(10) {
            let _ = writeln!(
                output,
                "- {}: {:.2} completions per week",
                average.name, average.average_per_week
            );
        }
    }

    Ok(output)
}
