//! Error types for ghosttype-core

use thiserror::Error;

use crate::store::StoreError;

/// Top-level error type for ghosttype-core
#[derive(Error, Debug)]
pub enum GhosttypeError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Model service error: {0}")]
    Client(#[from] ClientError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

/// Errors from individual predictors.
///
/// The ensemble swallows these: a failing predictor contributes an empty
/// result to the cycle, never an error to the caller.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Model service error: {0}")]
    Client(#[from] ClientError),

    #[error("{0}")]
    Other(String),
}

/// Errors from the external model service client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    Parse(String),
}

/// Errors from sync workers
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_displays_store_cause() {
        let err = ModelError::Store(StoreError::Migration("v002 failed".into()));
        assert!(err.to_string().contains("v002 failed"));
    }

    #[test]
    fn client_error_api_displays_status_and_body() {
        let err = ClientError::Api {
            status: 503,
            body: "loading model".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("loading model"));
    }

    #[test]
    fn ghosttype_error_converts_from_worker_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: GhosttypeError = WorkerError::Io(io).into();
        assert!(matches!(err, GhosttypeError::Worker(_)));
    }
}
