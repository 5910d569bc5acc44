use histree::hash::ParseDigestError;

use crate::{config::ConfigError, events::EventLogError};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to load config")]
    Config(#[from] ConfigError),

    #[error("invalid log filter")]
    TracingParse(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to install logger")]
    TracingInit(#[from] tracing_subscriber::util::TryInitError),

    #[error("no event log given, pass --events or set `events` in config.toml")]
    MissingEventLog,

    #[error("invalid digest")]
    Digest(#[from] ParseDigestError),

    #[error("invalid hex salt")]
    Hex(#[from] hex::FromHexError),

    #[error("salt {0} does not fit in a 256-bit word")]
    SaltOutOfRange(String),

    #[error(transparent)]
    History(#[from] histree::Error),

    #[error("failed to sync with the event log")]
    Sync(#[from] histree::ledger::SyncError<EventLogError>),

    #[error(transparent)]
    EventLog(#[from] EventLogError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
