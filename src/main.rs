use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phishing_sim::config::AppConfig;
use phishing_sim::db::{AttemptStore, Database};
use phishing_sim::mail::{ConsoleMailer, MailSender, SmtpMailer};
use phishing_sim::models::{AttemptFilter, AttemptStatus};
use phishing_sim::{api, phishing::PhishingService};

#[derive(Parser)]
#[command(name = "phishing-sim")]
#[command(about = "Phishing-awareness simulation: send tracked emails and record clicks")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Send one simulation email and print the stored attempt
    Send {
        /// Recipient address
        email: String,
    },
    /// Print stored attempts as JSON
    Attempts {
        /// Only attempts with this status (sent, failed, clicked)
        #[arg(short, long)]
        status: Option<String>,
    },
}

/// Initialize tracing with output to stderr (for commands printing JSON) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "phishing_sim=debug,tower_http=debug".into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open_database(config: &AppConfig) -> anyhow::Result<Database> {
    let db = match &config.database_path {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

fn build_service(config: &AppConfig, db: Database) -> anyhow::Result<PhishingService> {
    let mailer: Arc<dyn MailSender> = match &config.mailer {
        Some(mailer_config) => {
            tracing::info!(
                "Delivering mail via SMTP relay {}:{}",
                mailer_config.host,
                mailer_config.port
            );
            Arc::new(SmtpMailer::new(mailer_config)?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, mail will be logged instead of delivered");
            Arc::new(ConsoleMailer)
        }
    };

    Ok(PhishingService::new(
        mailer,
        Arc::new(db),
        config.phishing.clone(),
    ))
}

async fn serve(config: AppConfig, host: &str, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting phishing-sim server on port {}", port);

    let db = open_database(&config)?;
    let service = build_service(&config, db)?;
    let app = api::create_router(service, config.security.clone());

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("phishing-sim server listening on http://{}:{}", host, port);
    tracing::info!("Tracking links use base URL {}", config.phishing.app_url);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(
        cli.command,
        Some(Commands::Send { .. }) | Some(Commands::Attempts { .. })
    );
    init_tracing(use_stderr);

    let config = AppConfig::from_env()?;

    match cli.command {
        Some(Commands::Serve { port, host }) => serve(config, &host, port).await?,
        Some(Commands::Send { email }) => {
            let db = open_database(&config)?;
            let service = build_service(&config, db)?;
            let attempt = service.send_phishing_email(&email).await?;
            println!("{}", serde_json::to_string_pretty(&attempt)?);
        }
        Some(Commands::Attempts { status }) => {
            let status = match status {
                Some(s) => Some(
                    AttemptStatus::from_str(&s)
                        .ok_or_else(|| anyhow::anyhow!("Unknown status: {}", s))?,
                ),
                None => None,
            };
            let db = open_database(&config)?;
            let attempts = db.list_attempts(&AttemptFilter {
                status,
                email: None,
            })?;
            println!("{}", serde_json::to_string_pretty(&attempts)?);
        }
        None => serve(config, "127.0.0.1", 3000).await?,
    }

    Ok(())
}
