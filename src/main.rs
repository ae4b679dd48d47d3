use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use portal_grades::config::{self, Config};
use portal_grades::db::{PgSnapshotStore, SnapshotStore};
use portal_grades::models::{Identity, Session};
use portal_grades::pages;
use portal_grades::portal::PortalClient;
use portal_grades::sync::SyncService;
use portal_grades::{
    extract_attendance, extract_grades, extract_periods, rank_entries, report, user_ranking,
    Dimension, PortalError,
};

#[derive(Parser)]
#[command(name = "portal-grades")]
#[command(about = "Grade, attendance and leaderboard extraction for the school portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Parse a saved grades page
    Grades {
        #[arg(long)]
        html: PathBuf,
        /// Also export the grades as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print the records as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Parse a saved attendance page
    Attendance {
        #[arg(long)]
        html: PathBuf,
    },
    /// Generate a markdown report from saved pages
    Report {
        #[arg(long)]
        grades_html: PathBuf,
        #[arg(long)]
        attendance_html: Option<PathBuf>,
        #[arg(long)]
        student: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Register a portal user and opt them into the leaderboard
    Register {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        name: String,
    },
    /// Refresh a user's snapshot from the live portal
    Sync {
        #[arg(long)]
        uid: String,
        /// PHPSESSID issued by the portal login
        #[arg(long)]
        session: String,
    },
    /// Print the teacher's notes attached to one grade
    Notes {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        session: String,
        #[arg(long)]
        event_id: i64,
    },
    /// Look a subject up in the class lesson directory
    Subject {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        session: String,
        #[arg(long)]
        name: String,
    },
    /// Print the leaderboard for one dimension
    Leaderboard {
        #[arg(long, value_enum, default_value_t = Dimension::Average)]
        by: Dimension,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print a user's rank in every dimension
    Rank {
        #[arg(long)]
        internal_id: Uuid,
    },
}

fn read_page(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

async fn connect_store() -> anyhow::Result<PgSnapshotStore> {
    let database_url = config::database_url()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(PgSnapshotStore::new(pool))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::InitDb => {
            connect_store().await?.init_db().await?;
            println!("Schema ready.");
        }
        Commands::Grades { html, csv, json } => {
            let page = read_page(&html)?;
            let grades = extract_grades(&page, None)?;

            if let Some(csv) = csv {
                let written = report::write_grades_csv(&csv, &grades)?;
                println!("Wrote {written} grades to {}.", csv.display());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&grades)?);
            } else {
                for summary in report::summarize_by_subject(&grades) {
                    let average = summary
                        .average
                        .map(|a| format!("{a:.2}"))
                        .unwrap_or_else(|| "n/a".to_string());
                    println!(
                        "- {}: {} across {} grades",
                        summary.subject_name, average, summary.count
                    );
                }
            }
        }
        Commands::Attendance { html } => {
            let summary = extract_attendance(&read_page(&html)?);
            println!(
                "Absence hours: {}, tardies: {}",
                summary.absence_hours, summary.tardy_count
            );
        }
        Commands::Report {
            grades_html,
            attendance_html,
            student,
            out,
        } => {
            let page = read_page(&grades_html)?;
            let periods = extract_periods(&page);
            let grades = extract_grades(&page, Some(periods.as_slice()))?;
            let attendance = match attendance_html {
                Some(path) => Some(extract_attendance(&read_page(&path)?)),
                None => None,
            };

            let report = report::build_report(student.as_deref(), &periods, &grades, attendance);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Register { uid, name } => {
            let internal_id = connect_store().await?.register_user(&uid, &name).await?;
            println!("Registered {uid} as {internal_id}.");
        }
        Commands::Sync { uid, session } => {
            let store = connect_store().await?;
            let snapshot = store
                .load_snapshot(&uid)
                .await?
                .ok_or_else(|| PortalError::UnknownUser(uid.clone()))?;
            let identity = Identity {
                user_id: uid.clone(),
                internal_id: snapshot.internal_id,
            };
            let session = Session {
                session_id: session,
                user_id: uid,
            };

            let client = PortalClient::new(&config)?;
            let service = SyncService::new(client, store, config.refresh_window);
            let outcome = service
                .refresh(&identity, &session, chrono::Utc::now())
                .await?;
            println!("Sync finished: {outcome:?}.");
        }
        Commands::Notes {
            uid,
            session,
            event_id,
        } => {
            let client = PortalClient::new(&config)?;
            let session = Session {
                session_id: session,
                user_id: uid,
            };
            let notes = pages::fetch_grade_notes(&client, &session, event_id).await?;
            if notes.is_empty() {
                println!("No notes for grade {event_id}.");
            } else {
                println!("{notes}");
            }
        }
        Commands::Subject { uid, session, name } => {
            let client = PortalClient::new(&config)?;
            let session = Session {
                session_id: session,
                user_id: uid,
            };
            match pages::fetch_subject(&client, &session, &name).await? {
                Some(subject) => println!("{} (id {})", subject.name, subject.id),
                None => println!("No subject matching {name}."),
            }
        }
        Commands::Leaderboard { by, limit } => {
            let entries = connect_store().await?.leaderboard_entries().await?;
            let ranked = rank_entries(&entries, by);

            if ranked.is_empty() {
                println!("No users on the leaderboard yet.");
                return Ok(());
            }

            println!("Top users by {}:", by.label());
            for (index, entry) in ranked.iter().take(limit).enumerate() {
                println!(
                    "{}. {} {:.2}",
                    index + 1,
                    entry.name,
                    by.key(entry)
                );
            }
        }
        Commands::Rank { internal_id } => {
            let entries = connect_store().await?.leaderboard_entries().await?;
            let ranking = user_ranking(&entries, internal_id);
            let show = |rank: Option<usize>| {
                rank.map(|r| r.to_string())
                    .unwrap_or_else(|| "-".to_string())
            };

            println!("Average: {}", show(ranking.average_rank));
            println!("Absence hours: {}", show(ranking.absences_rank));
            println!("Tardies: {}", show(ranking.tardies_rank));
            println!("Followers: {}", show(ranking.followers_rank));
        }
    }

    Ok(())
}
