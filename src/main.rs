use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use autocheckin::config::AppConfig;
use autocheckin::runner::{Runner, Trigger};
use autocheckin::scheduler::CheckinSchedule;

#[derive(Parser)]
#[command(
    name = "autocheckin",
    about = "Automated daily check-in for multiple accounts with domain fallback",
    version,
    long_about = None
)]
struct Cli {
    /// TOML config file (environment variables still override it)
    #[arg(long, global = true, env = "AUTOCHECKIN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (HTTP trigger + scheduler)
    Serve {
        /// Bind address, overriding the config file
        #[arg(long)]
        bind: Option<String>,
    },

    /// Check in every account once and print the report
    Run {
        /// Skip push notifications
        #[arg(long)]
        no_notify: bool,
    },

    /// Inspect the check-in schedule
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Print the effective configuration with secrets redacted
    Config,
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// Preview the next scheduled runs
    DryRun {
        /// Number of runs to show
        #[arg(long, default_value = "5")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            tracing::info!(bind = %config.server.bind, "Starting autocheckin daemon");
            autocheckin::serve(config).await?;
        }
        Commands::Run { no_notify } => {
            let runner = Runner::new(config.into()).context("Failed to build HTTP client")?;
            let result = if no_notify {
                runner.run().await
            } else {
                runner.run_and_notify(Trigger::Cli).await
            };
            let report = result?;

            println!("\n=== Check-in Report ({}) ===", report.run_id);
            for line in report.lines() {
                println!("{}", line);
            }
            println!(
                "{} account(s), {} failure(s) in {:.1}s\n",
                report.results.len(),
                report.failure_count(),
                report.elapsed().num_milliseconds() as f64 / 1000.0
            );
        }
        Commands::Schedule { action } => match action {
            ScheduleAction::DryRun { count } => {
                let schedule = CheckinSchedule::parse(&config.schedule.cron)?;
                if !config.schedule.enabled {
                    println!("Scheduler is disabled; preview only.");
                }
                println!("Upcoming runs for '{}' (UTC):", schedule.expr());
                for time in schedule.preview(&chrono::Utc::now(), count) {
                    println!("  {}", time.to_rfc3339());
                }
            }
        },
        Commands::Config => {
            let printed = toml::to_string_pretty(&config.redacted())
                .context("Failed to render configuration")?;
            println!("{}", printed);
        }
    }

    Ok(())
}
