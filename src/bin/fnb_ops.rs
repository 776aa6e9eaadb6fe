use std::{str::FromStr, sync::Arc};

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use fnb_backoffice::{
    common::{parse_date, DateRange},
    config::{self, AppConfig},
    db::{self, DbPool},
    jobs::{beat_schedule, JobInvocation, JobKind, JobRunner},
    migrator::Migrator,
    services::reports::{ReportFilter, ReportKind, ReportService},
};
use serde::Serialize;

/// Operator commands for the back office: migrations, the job table and
/// one-off job or report runs.
#[derive(Parser)]
#[command(name = "fnb-ops", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations
    Migrate,
    /// Print the migration log with dependencies
    Migrations,
    /// Print the periodic job table
    Schedule,
    /// Run one job immediately
    RunJob(RunJobArgs),
    /// Run a report and print the result
    Report(ReportArgs),
}

#[derive(Args)]
struct RunJobArgs {
    /// Task id (`jobs.expire_member_points`) or entry name
    task: String,
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Business date to process instead of today's
    #[arg(long)]
    date: Option<String>,
}

#[derive(Args)]
struct ReportArgs {
    /// Report slug, e.g. `daily-sales`
    kind: String,
    #[arg(long)]
    start: String,
    #[arg(long)]
    end: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Migrations => print_migrations(cli.json)?,
        Commands::Schedule => print_schedule(cli.json)?,
        Commands::Migrate => {
            let (_, pool) = connect().await?;
            db::run_migrations(&pool)
                .await
                .context("failed to apply migrations")?;
            db::close_pool(pool).await?;
            println!("migrations applied");
        }
        Commands::RunJob(args) => run_job(args, cli.json).await?,
        Commands::Report(args) => run_report(args).await?,
    }

    Ok(())
}

async fn connect() -> Result<(AppConfig, DbPool)> {
    let config = config::load_config().context("failed to load application config")?;
    config::init_tracing(config.log_level(), config.log_json);
    let pool = db::establish_connection_from_app_config(&config)
        .await
        .context("failed to connect to database")?;
    Ok((config, pool))
}

fn print_migrations(json: bool) -> Result<()> {
    let history = Migrator::history();
    if json {
        let rows: Vec<_> = history
            .iter()
            .map(|m| serde_json::json!({ "name": m.name, "depends_on": m.depends_on }))
            .collect();
        return print_json(&rows);
    }
    for record in history {
        if record.depends_on.is_empty() {
            println!("- {}", record.name);
        } else {
            println!("- {} (after {})", record.name, record.depends_on.join(", "));
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ScheduleRow {
    name: &'static str,
    task: &'static str,
    trigger: String,
    expires_secs: i64,
}

fn print_schedule(json: bool) -> Result<()> {
    let rows: Vec<ScheduleRow> = beat_schedule()
        .into_iter()
        .map(|entry| ScheduleRow {
            name: entry.name,
            task: entry.task,
            trigger: entry.trigger.to_string(),
            expires_secs: entry.expires.num_seconds(),
        })
        .collect();
    if json {
        return print_json(&rows);
    }
    for row in rows {
        println!(
            "- {} • {} • {} • expires after {}s",
            row.name, row.task, row.trigger, row.expires_secs
        );
    }
    Ok(())
}

async fn run_job(args: RunJobArgs, json: bool) -> Result<()> {
    let job = JobKind::from_task(&args.task).ok_or_else(|| anyhow!("unknown task '{}'", args.task))?;
    let date: Option<NaiveDate> = args
        .date
        .as_deref()
        .map(|d| parse_date("date", d))
        .transpose()?;

    let (config, pool) = connect().await?;
    let runner = JobRunner::new(Arc::new(pool), &config);
    let now = Utc::now();
    let invocation = JobInvocation::new(job, now)
        .dry_run(args.dry_run)
        .for_date(date);
    let run = runner.execute(&invocation, now).await?;

    if json {
        return print_json(&run);
    }
    println!(
        "{} • {:?} • {}",
        run.job_name,
        run.status,
        run.detail.as_deref().unwrap_or("-")
    );
    Ok(())
}

async fn run_report(args: ReportArgs) -> Result<()> {
    let kind = ReportKind::from_str(&args.kind)
        .map_err(|_| anyhow!("unknown report '{}'", args.kind))?;
    let range = DateRange::parse(&args.start, &args.end)?;

    let (config, pool) = connect().await?;
    let service = ReportService::new(Arc::new(pool), config.business_offset());
    let data = service.run(kind, &ReportFilter::for_range(range)).await?;
    print_json(&data)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
