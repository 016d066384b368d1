use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use student_grade_engine::{cohort, db, report, GradeCalculator, Metric};

#[derive(Parser)]
#[command(name = "student-grades")]
#[command(about = "Student grade metrics and cohort statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    Statistics,
    Summary,
    Transcript,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a small sample roster
    Seed,
    /// Import grades from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Compute metrics for one student
    #[command(group(
        ArgGroup::new("selection")
            .args(["metric", "all"])
            .multiple(false)
    ))]
    Grade {
        /// Student code, e.g. SV001
        student: String,
        #[arg(long, value_enum)]
        metric: Option<Metric>,
        /// Show every available metric
        #[arg(long)]
        all: bool,
    },
    /// Classification statistics across all students
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Per-student metric summary
    Summary,
    /// Write a markdown report to disk
    Report {
        #[arg(long, value_enum, default_value = "statistics")]
        kind: ReportKind,
        /// Student code, required for transcripts
        #[arg(long)]
        student: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    debug!("connected to Postgres");

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let outcome = db::import_csv(&pool, &csv).await?;
            println!(
                "Inserted {} grades from {} ({} duplicates, {} rejected).",
                outcome.inserted,
                csv.display(),
                outcome.duplicates,
                outcome.rejected
            );
        }
        Commands::Grade {
            student,
            metric,
            all,
        } => {
            let Some(record) = db::fetch_student(&pool, &student).await? else {
                bail!("no student with code {student}");
            };

            let calculator = GradeCalculator::with_metric(metric.unwrap_or_default());
            println!("{} ({})", record.full_name, record.student_id);
            if all {
                for metric in calculator.available() {
                    println!(
                        "- {}: {}",
                        metric.name(),
                        calculator.compute_with(metric, &record.grades)
                    );
                }
            } else {
                println!(
                    "- {}: {}",
                    calculator.name(),
                    calculator.compute(&record.grades)
                );
            }
        }
        Commands::Stats { json } => {
            let students = db::fetch_students(&pool).await?;
            let stats = cohort::aggregate(&students);
            info!(students = stats.total_students, "cohort statistics computed");

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!(
                    "{}",
                    report::build_statistics_report(&stats, Local::now().naive_local())
                );
            }
        }
        Commands::Summary => {
            let students = db::fetch_students(&pool).await?;
            print!(
                "{}",
                report::build_summary_report(&students, Local::now().naive_local())
            );
        }
        Commands::Report { kind, student, out } => {
            let generated_at = Local::now().naive_local();
            let content = match kind {
                ReportKind::Statistics => {
                    let students = db::fetch_students(&pool).await?;
                    report::build_statistics_report(&cohort::aggregate(&students), generated_at)
                }
                ReportKind::Summary => {
                    let students = db::fetch_students(&pool).await?;
                    report::build_summary_report(&students, generated_at)
                }
                ReportKind::Transcript => {
                    let code = student.context("--student is required for transcripts")?;
                    let Some(record) = db::fetch_student(&pool, &code).await? else {
                        bail!("no student with code {code}");
                    };
                    report::build_transcript(&record, generated_at)
                }
            };
            std::fs::write(&out, content)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
