//! Engine errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A result row carried a status outside `P F E D M`
    #[error(
        "data integrity error: unrecognized status '{status}' for test '{test_name}' on host '{host}' context '{context}'"
    )]
    DataIntegrity {
        test_name: String,
        host: String,
        context: String,
        status: String,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
