use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use oddsgate::config::Config;
use oddsgate::domain::{BetRequest, BetType, MarketKind, MatchId, TrackingId};
use oddsgate::service::Service;

#[derive(Parser)]
#[command(name = "oddsgate", version, about = "Normalized odds extraction and wager placement over wagering venues")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a normalized market snapshot from one venue.
    Snapshot {
        /// Venue name (e.g. bookline, wagerhall, pickspot).
        #[arg(long)]
        provider: String,
        /// Abstract market tier (e.g. mens, womens).
        #[arg(long)]
        kind: String,
    },
    /// Place one wager on a venue.
    Bet {
        /// Venue name.
        #[arg(long)]
        provider: String,
        /// Abstract market tier.
        #[arg(long)]
        kind: String,
        /// Canonical match id (sorted participant names joined with '|').
        #[arg(long)]
        match_id: String,
        /// Participant display name to back.
        #[arg(long)]
        participant: String,
        /// Requested stake; clamped to the venue maximum.
        #[arg(long)]
        stake: Decimal,
        /// Market to stake: outright or spread.
        #[arg(long, default_value = "outright")]
        bet_type: BetType,
        /// Correlation id for audit artifacts; generated when omitted.
        #[arg(long)]
        tracking_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    config.init_logging();

    let service = Service::new(&config)?;
    let result = run(&service, cli.command).await;
    service.shutdown().await;

    let output = result?;
    println!("{output}");
    Ok(())
}

async fn run(service: &Service, command: Command) -> anyhow::Result<String> {
    match command {
        Command::Snapshot { provider, kind } => {
            let snapshot = service
                .market_snapshot(&provider, &MarketKind::new(kind))
                .await?;
            Ok(serde_json::to_string_pretty(&snapshot)?)
        }
        Command::Bet {
            provider,
            kind,
            match_id,
            participant,
            stake,
            bet_type,
            tracking_id,
        } => {
            let request = BetRequest {
                kind: MarketKind::new(kind),
                bet_type,
                tracking_id: tracking_id.map(TrackingId::from).unwrap_or_default(),
                match_id: MatchId::new(match_id),
                participant,
                stake,
            };
            let receipt = service.place_bet(&provider, request).await?;
            Ok(serde_json::to_string_pretty(&receipt)?)
        }
    }
}
