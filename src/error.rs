use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors raised by venue drivers, classified by how the caller recovers.
///
/// Only `Authentication` aborts a whole operation. `SectionUnavailable`,
/// `TransientUi`, `ExtractionMismatch` and `StakeRead` are scoped to one
/// section or entry; the aggregator continues past them.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Fatal: the whole operation aborts.
    #[error("authentication failed for {provider}: {reason}")]
    Authentication {
        provider: &'static str,
        reason: String,
    },

    /// Recoverable: skip to the next declared section.
    #[error("section '{section}' unavailable: {reason}")]
    SectionUnavailable { section: String, reason: String },

    /// Recoverable with bounded retry (e.g. a menu click behind a splash overlay).
    #[error("transient UI failure: {0}")]
    TransientUi(String),

    /// Drop the affected entry, continue with the rest.
    #[error("extraction mismatch: {0}")]
    ExtractionMismatch(String),

    /// Fatal for this section's stake attempt only; falls through to the next.
    #[error("failed to read stake limit: {0}")]
    StakeRead(String),

    /// Every configured section was exhausted without a committed stake.
    #[error("no matching offering for match '{match_id}'")]
    NoMatchingOffering { match_id: String },

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("no credentials on file for provider '{0}'")]
    MissingCredentials(String),
}

impl ProviderError {
    /// Whether the aggregator may continue with the next section after this error.
    #[must_use]
    pub fn is_section_scoped(&self) -> bool {
        matches!(
            self,
            Self::SectionUnavailable { .. }
                | Self::TransientUi(_)
                | Self::ExtractionMismatch(_)
                | Self::StakeRead(_)
        )
    }
}

/// Session pool errors.
///
/// `CreationFailed` is `Clone` so a single failed in-flight creation can be
/// fanned out to every waiter that joined it.
#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("session creation failed: {0}")]
    CreationFailed(String),

    #[error("released unknown session {0}")]
    UnknownSession(String),
}

/// Odds and money string parsing errors.
///
/// A malformed odds value is a fatal per-entry error; it is never coerced to
/// zero, since zero would misrepresent a real price.
#[derive(Error, Debug)]
pub enum OddsError {
    #[error("invalid odds string '{0}'")]
    InvalidOdds(String),

    #[error("invalid handicap string '{0}'")]
    InvalidHandicap(String),

    #[error("invalid money string '{0}'")]
    InvalidMoney(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Odds(#[from] OddsError),

    #[error("browser error: {0}")]
    Browser(Box<chromiumoxide::error::CdpError>),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(std::time::Duration, String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Browser(Box::new(err))
    }
}

impl Error {
    /// Whether this error is scoped to a single section (see [`ProviderError`]).
    #[must_use]
    pub fn is_section_scoped(&self) -> bool {
        matches!(self, Error::Provider(p) if p.is_section_scoped())
    }
}
