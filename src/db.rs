use std::collections::HashMap;

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{HabitRecord, MonthData, MAX_HABIT_NAME_LEN};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub fn days_in_month(year: i32, month: u32) -> anyhow::Result<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("invalid month {year}-{month:02}"))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .context("invalid date")?;
    Ok((next - first).num_days() as u32)
}

async fn upsert_habit(pool: &PgPool, name: &str) -> anyhow::Result<Uuid> {
    if name.trim().is_empty() {
        anyhow::bail!("habit name cannot be empty");
    }
    if name.chars().count() > MAX_HABIT_NAME_LEN {
        anyhow::bail!("habit name must be {MAX_HABIT_NAME_LEN} characters or less: {name}");
    }

    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO tasktraq.habits (id, name, position)
        VALUES ($1, $2, (SELECT COALESCE(MAX(position) + 1, 0) FROM tasktraq.habits))
        ON CONFLICT (name) DO UPDATE
        SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

pub async fn upsert_log(
    pool: &PgPool,
    habit_name: &str,
    day: NaiveDate,
    completed: bool,
) -> anyhow::Result<()> {
    let habit_id = upsert_habit(pool, habit_name).await?;

    sqlx::query(
        r#"
        INSERT INTO tasktraq.daily_logs (id, habit_id, day, completed)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (habit_id, day) DO UPDATE
        SET completed = EXCLUDED.completed, updated_at = now()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(habit_id)
    .bind(day)
    .bind(completed)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let habits = vec![
        (
            Uuid::parse_str("7f3c2a9e-5d41-4b08-9f2e-1c6a8d0b4e73")?,
            "Morning run",
            0,
        ),
        (
            Uuid::parse_str("2b8e6f1d-93a7-4c55-b0d4-7e92c3a1f586")?,
            "Read 20 pages",
            1,
        ),
        (
            Uuid::parse_str("c4d19e72-0b36-48af-a8e1-5f7d2c9b6a04")?,
            "Meditate",
            2,
        ),
    ];

    for (id, name, position) in &habits {
        sqlx::query(
            r#"
            INSERT INTO tasktraq.habits (id, name, position)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET position = EXCLUDED.position
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(position)
        .execute(pool)
        .await?;
    }

    // A month of plausible history: the runner is steady, the reader
    // skips every third day, meditation tails off mid-month.
    let year = 2026;
    let month = 8;
    let days = days_in_month(year, month)?;

    for day in 1..=days {
        let date = NaiveDate::from_ymd_opt(year, month, day).context("invalid date")?;
        let patterns = [
            (habits[0].1, day % 7 != 0),
            (habits[1].1, day % 3 != 0),
            (habits[2].1, day <= 16),
        ];
        for (name, completed) in patterns {
            upsert_log(pool, name, date, completed).await?;
        }
    }

    Ok(())
}

/// Build the month's 0/1 completion matrix. Habits come back in the
/// order the user created them, which downstream stable sorts rely on.
pub async fn fetch_month(pool: &PgPool, year: i32, month: u32) -> anyhow::Result<MonthData> {
    let total_days = days_in_month(year, month)?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).context("invalid date")?;
    let last = NaiveDate::from_ymd_opt(year, month, total_days).context("invalid date")?;

    let habit_rows = sqlx::query(
        "SELECT id, name FROM tasktraq.habits ORDER BY position, created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut habits = Vec::new();
    let mut index_by_id: HashMap<Uuid, usize> = HashMap::new();

    for row in habit_rows {
        let id: Uuid = row.get("id");
        index_by_id.insert(id, habits.len());
        habits.push(HabitRecord {
            id,
            name: row.get("name"),
            days: vec![0; total_days as usize],
        });
    }

    let log_rows = sqlx::query(
        r#"
        SELECT habit_id, day FROM tasktraq.daily_logs
        WHERE completed AND day >= $1 AND day <= $2
        "#,
    )
    .bind(first)
    .bind(last)
    .fetch_all(pool)
    .await?;

    for row in log_rows {
        let habit_id: Uuid = row.get("habit_id");
        let day: NaiveDate = row.get("day");
        if let Some(&index) = index_by_id.get(&habit_id) {
            habits[index].days[day.day0() as usize] = 1;
        }
    }

    Ok(MonthData {
        year,
        month,
        days_in_month: total_days,
        habits,
    })
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        habit: String,
        day: NaiveDate,
        completed: bool,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut imported = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        upsert_log(pool, &row.habit, row.day, row.completed).await?;
        imported += 1;
    }

    Ok(imported)
}
