//! `tender-reconcile` - matches two tender versions from a JSON fixture and
//! optionally transfers the priced content of the old one.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use tender_reconciliation::adapters::{InMemoryEventBus, InMemoryStore, TenderFixture};
use tender_reconciliation::application::{
    ApplyTransferCommand, ApplyTransferHandler, AutoMatchCommand, AutoMatchHandler,
    RejectedPosition,
};
use tender_reconciliation::config::AppConfig;
use tender_reconciliation::domain::foundation::TenderId;
use tender_reconciliation::domain::reconciliation::Mapping;
use tender_reconciliation::domain::transfer::TransferResult;
use tender_reconciliation::ports::MappingRepository;
use tender_reconciliation::telemetry;

#[derive(Parser)]
#[command(name = "tender-reconcile")]
#[command(about = "Reconcile bills of quantities across tender versions")]
#[command(version)]
struct Cli {
    /// Settings file (TOML, JSON or YAML); environment variables override it
    #[arg(long, short = 'c', env = "TENDER_RECON_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the auto-matching pass and print the proposed mappings
    Match {
        /// Fixture with `old` and `new` tender versions
        fixture: PathBuf,
    },
    /// Match, then copy items and links for every confirmed mapping
    Apply {
        fixture: PathBuf,
    },
}

#[derive(Serialize)]
struct Report {
    old_tender_id: TenderId,
    new_tender_id: TenderId,
    rejected: Vec<RejectedPosition>,
    mappings: Vec<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transfer: Option<TransferResult>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{}", json);
                let failed = report
                    .transfer
                    .as_ref()
                    .is_some_and(|t| !t.errors.is_empty());
                if failed {
                    ExitCode::from(2)
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(e) => {
                eprintln!("Error: failed to render report: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Report> {
    let config = AppConfig::load_with_file(cli.config.as_deref())
        .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    telemetry::init(&config.telemetry);

    let (fixture_path, transfer) = match cli.command {
        Commands::Match { fixture } => (fixture, false),
        Commands::Apply { fixture } => (fixture, true),
    };

    let fixture = TenderFixture::load(&fixture_path)
        .with_context(|| format!("failed to load fixture {}", fixture_path.display()))?;
    let store = InMemoryStore::new();
    let tenders = fixture.seed(&store).await?;
    let bus = Arc::new(InMemoryEventBus::new());

    let matcher = AutoMatchHandler::new(
        Arc::new(store.positions.clone()),
        Arc::new(store.mappings.clone()),
        bus.clone(),
    );
    let matched = matcher
        .handle(AutoMatchCommand {
            old_tender_id: tenders.old,
            new_tender_id: tenders.new,
            options: config.matching.options(),
        })
        .await?;

    let transfer = if transfer {
        let handler = ApplyTransferHandler::new(
            Arc::new(store.items.clone()),
            Arc::new(store.links.clone()),
            Arc::new(store.mappings.clone()),
            bus.clone(),
            config.transfer_settings(),
        );
        Some(handler.handle(ApplyTransferCommand::new(tenders.new)).await?)
    } else {
        None
    };

    let mappings = if transfer.is_some() {
        store.mappings.list_by_new_tender(&tenders.new).await?
    } else {
        matched.mappings
    };

    Ok(Report {
        old_tender_id: tenders.old,
        new_tender_id: tenders.new,
        rejected: matched.rejected,
        mappings,
        transfer,
    })
}
