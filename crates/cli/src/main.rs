//! Guardscreen CLI - Main entry point

use clap::{Parser, Subcommand};
use guardscreen_cli::{commands, AppContext, ContextOptions};
use guardscreen_engine::ScreeningMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "guardscreen")]
#[command(about = "Guardscreen - background check screening engine", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Starting credit balance
    #[arg(long, global = true)]
    credits: Option<i64>,

    /// Screening mode: single or multi
    #[arg(long, global = true)]
    mode: Option<ScreeningMode>,

    /// Append audit events to this JSONL file
    #[arg(long, global = true)]
    audit_log: Option<PathBuf>,

    /// Fingerprint secret (generated when omitted)
    #[arg(long, global = true, env = "GUARDSCREEN_SECRET")]
    secret: Option<String>,

    /// Seed for the simulated sources
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen an identity and wait for the result
    Screen {
        /// Full name
        name: String,
        /// Date of birth (YYYY-MM-DD)
        dob: String,
        /// Last four digits of the SSN
        ssn_last4: String,
    },

    /// Print the fingerprint of an identity
    Fingerprint {
        name: String,
        dob: String,
        ssn_last4: String,
    },

    /// Print the effective configuration
    Config,

    /// List audit events, newest first
    Audits {
        /// Page size; 0 uses the configured default
        #[arg(long, default_value_t = 0)]
        limit: usize,
        /// Id of the last event on the previous page
        #[arg(long)]
        cursor: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let options = ContextOptions {
        config: cli.config,
        credits: cli.credits,
        mode: cli.mode,
        audit_log: cli.audit_log,
        secret: cli.secret.clone(),
        seed: cli.seed,
    };

    match cli.command {
        Commands::Screen {
            name,
            dob,
            ssn_last4,
        } => {
            let ctx = AppContext::new(options).await?;
            commands::screen(&ctx, &name, &dob, &ssn_last4).await?;
        }

        Commands::Fingerprint {
            name,
            dob,
            ssn_last4,
        } => {
            let Some(secret) = cli.secret else {
                anyhow::bail!("--secret (or GUARDSCREEN_SECRET) is required");
            };
            commands::fingerprint(&name, &dob, &ssn_last4, &secret)?;
        }

        Commands::Config => {
            let ctx = AppContext::new(options).await?;
            commands::config(&ctx).await?;
        }

        Commands::Audits { limit, cursor } => {
            let ctx = AppContext::new(options).await?;
            commands::audits(&ctx, limit, cursor).await?;
        }
    }

    Ok(())
}
