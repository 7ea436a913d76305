use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};
use uuid::Uuid;

mod app;
mod auth;
mod chart;
mod config;
mod db;
mod error;
mod export;
mod models;
mod period;
mod report;
mod store;
mod summary;

use app::{App, SearchFilter};
use auth::{AccessGate, IdentityProvider, StaticIdentity};
use config::Config;
use db::PgStore;
use models::{NewStudent, School, Score, ScoreType};
use store::{MemoryStore, StudentStore};

#[derive(Parser)]
#[command(name = "score-manager")]
#[command(about = "Student score tracker with trend charts and exports", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Email to sign in as (falls back to SCORE_MANAGER_USER)
    #[arg(long, global = true)]
    user: Option<String>,
    /// Use a JSON snapshot file instead of Postgres
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Xlsx,
    Csv,
    Pdf,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo students
    Seed,
    /// Show students matching the search fields
    List {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        school: String,
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=3))]
        grade: Option<i32>,
        #[arg(long, default_value = "")]
        teacher: String,
        /// Print the matching documents as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the period labels for a score type
    Labels {
        #[arg(long = "type", value_parser = parse_score_type)]
        score_type: ScoreType,
    },
    AddStudent {
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_school)]
        school: School,
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=3))]
        grade: i32,
        #[arg(long, default_value = "")]
        teacher: String,
    },
    AddScore {
        #[arg(long)]
        student: Uuid,
        #[arg(long = "type", value_parser = parse_score_type)]
        score_type: ScoreType,
        /// Period label, see `labels`
        #[arg(long)]
        period: String,
        #[arg(long)]
        score: i64,
        #[arg(long)]
        subject: Option<String>,
    },
    /// Remove one score by its position in the student's list
    DeleteScore {
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        index: usize,
    },
    DeleteStudent {
        #[arg(long)]
        student: Uuid,
    },
    /// Export every score as a spreadsheet or printable PDF table
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
        format: ExportFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Plain-text dump of all students and scores
    Copy {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render trend charts for one student
    Chart {
        #[arg(long)]
        student: Uuid,
        #[arg(long, default_value = "charts")]
        out_dir: PathBuf,
    },
}

fn parse_school(value: &str) -> Result<School, String> {
    value.parse()
}

fn parse_score_type(value: &str) -> Result<ScoreType, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&cli.config)?;

    if let Commands::Labels { score_type } = &cli.command {
        for label in period::labels_for(*score_type) {
            println!("{label}");
        }
        return Ok(());
    }

    if let Some(path) = cli.data.clone() {
        let store = MemoryStore::open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        return run(cli, config, store).await;
    }

    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL or database_url in the config must be set (or pass --data)")?;
    let store = PgStore::connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    if matches!(cli.command, Commands::InitDb | Commands::Seed) {
        // Schema and seed writes go through the allow-list too, but need no mirror.
        let mut admin = build_app(&cli, &config, store.clone());
        let identity = admin.authenticate().await?;
        if matches!(cli.command, Commands::InitDb) {
            store.init_db().await?;
            println!("Schema ready.");
        } else {
            let inserted = store.seed().await?;
            println!("Inserted {inserted} demo students.");
        }
        info!(email = %identity.email, "admin command finished");
        admin.sign_out().await?;
        return Ok(());
    }

    run(cli, config, store).await
}

fn build_app<S: StudentStore>(cli: &Cli, config: &Config, store: S) -> App<S, StaticIdentity> {
    let gate = AccessGate::new(&config.allowed_emails);
    if gate.is_empty() {
        warn!(config = %cli.config.display(), "allow-list is empty, every sign-in will be rejected");
    } else {
        debug!(entries = gate.len(), "allow-list loaded");
    }

    let user = cli
        .user
        .clone()
        .or_else(|| std::env::var("SCORE_MANAGER_USER").ok());
    App::new(store, StaticIdentity::new(user), gate)
}

async fn run<S: StudentStore>(cli: Cli, config: Config, store: S) -> anyhow::Result<()> {
    let mut app = build_app(&cli, &config, store);
    let identity = app.sign_in().await?;
    info!(email = %identity.email, students = app.state().mirror.len(), "mirror loaded");

    execute(&mut app, cli.command, &config).await?;
    app.sign_out().await?;
    Ok(())
}

async fn execute<S, P>(app: &mut App<S, P>, command: Commands, config: &Config) -> anyhow::Result<()>
where
    S: StudentStore,
    P: IdentityProvider,
{
    match command {
        Commands::InitDb | Commands::Seed => {
            println!("Nothing to do: the snapshot store needs no schema or seed.");
        }
        Commands::Labels { .. } => {}
        Commands::List {
            name,
            school,
            grade,
            teacher,
            json,
        } => {
            app.set_search(SearchFilter {
                name,
                school,
                grade,
                teacher,
            });
            let students = app.visible_students();
            if json {
                println!("{}", serde_json::to_string_pretty(&students)?);
            } else if students.is_empty() {
                println!("No students match.");
            } else {
                for student in students {
                    println!("{}", report::build_student_card(student));
                }
            }
        }
        Commands::AddStudent {
            name,
            school,
            grade,
            teacher,
        } => {
            let id = app
                .add_student(NewStudent {
                    name,
                    school,
                    grade,
                    teacher,
                })
                .await?;
            println!("Added student {id}.");
        }
        Commands::AddScore {
            student,
            score_type,
            period,
            score,
            subject,
        } => {
            if !period::is_known_label(score_type, &period) {
                warn!(%period, %score_type, "period label is not in the vocabulary for this type");
            }
            let added = app
                .add_score(
                    student,
                    Score {
                        score_type,
                        date: period,
                        score,
                        subject,
                    },
                )
                .await?;
            if added {
                println!("Score added.");
            }
            print_card(app, student);
        }
        Commands::DeleteScore { student, index } => {
            if app.delete_score(student, index).await? {
                println!("Score removed.");
            }
            print_card(app, student);
        }
        Commands::DeleteStudent { student } => {
            if app.delete_student(student).await? {
                println!("Student {student} deleted.");
            }
        }
        Commands::Export { format, out } => {
            let rows = export::export_rows(&app.state().mirror);
            let out = out.unwrap_or_else(|| default_export_path(format));
            match format {
                ExportFormat::Xlsx => export::write_xlsx(&rows, &out)?,
                ExportFormat::Csv => export::write_csv(&rows, &out)?,
                ExportFormat::Pdf => {
                    let title = format!(
                        "Student scores ({})",
                        chrono::Local::now().format("%Y-%m-%d %H:%M")
                    );
                    export::write_pdf(&rows, &title, config.pdf.font.as_deref(), &out)?
                }
            }
            println!("Exported {} rows to {}.", rows.len(), out.display());
        }
        Commands::Copy { out } => {
            let dump = report::build_text_dump(&app.state().mirror);
            match out {
                Some(path) => {
                    std::fs::write(&path, &dump)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Copied to {}.", path.display());
                }
                None => println!("{dump}"),
            }
        }
        Commands::Chart { student, out_dir } => match app.find_student(student) {
            Some(found) => {
                let written = chart::render_student(found, &config.chart, &out_dir)?;
                if written.is_empty() {
                    println!("No scores to chart for {}.", found.name);
                }
                for path in written {
                    println!("Chart written to {}.", path.display());
                }
            }
            None => println!("Student {student} not found."),
        },
    }

    Ok(())
}

fn print_card<S, P>(app: &App<S, P>, student: Uuid)
where
    S: StudentStore,
    P: IdentityProvider,
{
    match app.find_student(student) {
        Some(found) => println!("{}", report::build_student_card(found)),
        None => println!("Student {student} not found."),
    }
}

fn default_export_path(format: ExportFormat) -> PathBuf {
    let name = match format {
        ExportFormat::Xlsx => "scores.xlsx",
        ExportFormat::Csv => "scores.csv",
        ExportFormat::Pdf => "scores.pdf",
    };
    Path::new(name).to_path_buf()
}
