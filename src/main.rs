use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::{PgPool, PgPoolOptions};

mod aggregate;
mod charts;
mod db;
mod models;
mod report;

use models::MonthData;

#[derive(Parser)]
#[command(name = "tasktraq")]
#[command(about = "Monthly habit analytics for TaskTraQ", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import daily logs from a CSV file (habit,day,completed)
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record one habit's completion for a day
    Log {
        #[arg(long)]
        habit: String,
        #[arg(long)]
        day: NaiveDate,
        /// Mark the day as missed instead of completed
        #[arg(long)]
        missed: bool,
    },
    /// Print the month's completion summary
    Summary {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        /// Read the month payload from a JSON file instead of Postgres
        #[arg(long)]
        from_json: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report for a month
    Report {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        from_json: Option<PathBuf>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Emit the dashboard chart payloads as JSON
    Charts {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        from_json: Option<PathBuf>,
        #[arg(long, default_value = "charts.json")]
        out: PathBuf,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load_month(
    year: Option<i32>,
    month: Option<u32>,
    from_json: Option<PathBuf>,
) -> anyhow::Result<MonthData> {
    if let Some(path) = from_json {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let data: MonthData = serde_json::from_str(&text)
            .with_context(|| format!("invalid month payload in {}", path.display()))?;
        return Ok(data);
    }

    let today = Utc::now().date_naive();
    let year = year.unwrap_or_else(|| today.year());
    let month = month.unwrap_or_else(|| today.month());

    let pool = connect().await?;
    db::fetch_month(&pool, year, month).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let imported = db::import_csv(&pool, &csv).await?;
            println!("Imported {imported} logs from {}.", csv.display());
        }
        Commands::Log { habit, day, missed } => {
            let pool = connect().await?;
            db::upsert_log(&pool, &habit, day, !missed).await?;
            let verb = if missed { "missed" } else { "completed" };
            println!("Logged {habit} as {verb} on {day}.");
        }
        Commands::Summary {
            year,
            month,
            from_json,
            limit,
        } => {
            let data = load_month(year, month, from_json).await?;
            let metrics = aggregate::month_metrics(&data)?;
            let buckets = aggregate::week_buckets(&data)?;

            println!("{}:", report::month_label(data.year, data.month));
            if data.habits.is_empty() {
                println!("No habits tracked this month.");
                return Ok(());
            }

            println!(
                "{} habits, {} of {} completions ({}%)",
                data.habits.len(),
                metrics.total_completed_days,
                metrics.total_possible_days,
                metrics.overall_completion_percent
            );

            println!("Top habits by completion rate:");
            for summary in metrics.habit_summaries.iter().take(limit) {
                println!(
                    "- {} {} / {} days ({}%)",
                    summary.name, summary.total, metrics.days_in_month, summary.percent_complete
                );
            }

            println!("Weekly completion:");
            for bucket in &buckets {
                println!(
                    "- Week {} (days {}-{}): {} completions, {}%",
                    bucket.week,
                    bucket.start_day,
                    bucket.end_day,
                    bucket.total_completions,
                    bucket.completion_percent
                );
            }
        }
        Commands::Report {
            year,
            month,
            from_json,
            out,
        } => {
            let data = load_month(year, month, from_json).await?;
            let rendered = report::build_report(&data)?;
            std::fs::write(&out, rendered)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Charts {
            year,
            month,
            from_json,
            out,
        } => {
            let data = load_month(year, month, from_json).await?;
            let registry = charts::build_all(&data)?;
            std::fs::write(&out, registry.to_json()?)?;
            println!(
                "Wrote {} chart payloads to {}.",
                registry.len(),
                out.display()
            );
        }
    }

    Ok(())
}
