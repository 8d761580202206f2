//! Error types for Sift

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("learn requires at least one of payee or iban")]
    InvalidLearnInput,

    #[error("invalid rule pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Classify itself resolves an untrained model to a `None` result; this
    /// error exists for hosts that gate an operation on a trained model.
    #[error("classifier has not been trained")]
    ModelNotTrained,

    #[error("a retrain is already in flight; retry once it finishes")]
    RetrainInFlight,

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("host store error: {0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, Error>;
