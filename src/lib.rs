//! Oddsgate - a normalized gateway over browser-driven wagering venues.
//!
//! The crate extracts current market odds and places wagers across several
//! external venues' web interfaces, presenting one interface despite each
//! venue having its own authentication flow, navigation taxonomy, and
//! markup.
//!
//! # Architecture
//!
//! - [`browser`] - browser session lifecycle: the leased [`browser::SessionPool`]
//!   over long-lived CDP sessions, and the per-request [`browser::PageHandle`]
//! - [`provider`] - the [`provider::ProviderDriver`] protocol, one
//!   implementation per venue, selected through [`provider::DriverRegistry`]
//! - [`aggregator`] - drives a provider across its declared sections for one
//!   snapshot or one wager
//! - [`domain`] - odds normalization, match/bet types, canonical ids
//! - [`service`] - the inbound facade tying the above together
//!
//! # Example
//!
//! ```no_run
//! use oddsgate::config::Config;
//! use oddsgate::domain::MarketKind;
//! use oddsgate::service::Service;
//!
//! # async fn run() -> oddsgate::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let service = Service::new(&config)?;
//! let snapshot = service.market_snapshot("bookline", &MarketKind::new("mens")).await?;
//! println!("{} matches", snapshot.matches.len());
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod artifact;
pub mod browser;
pub mod config;
pub mod domain;
pub mod error;
pub mod provider;
pub mod service;

#[cfg(feature = "testkit")]
pub mod testkit;
