use thiserror::Error;

use crate::config::ConfigError;
use crate::data::DataError;
use crate::domain::LookupError;

/// Fatal errors that end a run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("order references unknown instrument '{0}'")]
    UnknownInstrument(String),

    #[error("order for '{symbol}' has zero quantity")]
    ZeroQuantity { symbol: String },

    #[error("option '{option}' expired but underlying '{underlying}' has no close")]
    MissingUnderlying { option: String, underlying: String },

    #[error("strategy error: {0}")]
    Strategy(String),
}

impl SimError {
    pub fn strategy(msg: impl Into<String>) -> Self {
        Self::Strategy(msg.into())
    }
}
