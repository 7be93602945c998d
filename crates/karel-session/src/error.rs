//! Error types for the session facade.

use std::path::PathBuf;

use thiserror::Error;

use karel_core::{Diagnostic, Status};
use karel_vm::WorldError;

/// Configuration errors reported synchronously by the facade, before the
/// interpreter is entered.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read {path}: {source}")]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("compilation failed with {} error(s)", .0.len())]
    Compilation(Vec<Diagnostic>),

    #[error("bytecode and/or world not loaded")]
    StateNotValid,

    #[error("symbol '{0}' not found")]
    SymbolNotFound(String),

    #[error(transparent)]
    World(#[from] WorldError),
}

impl SessionError {
    /// The status code hosts observe for this error.
    pub fn status(&self) -> Status {
        match self {
            SessionError::FileNotFound { .. } => Status::FileNotFound,
            SessionError::Compilation(_) => Status::CompilationError,
            SessionError::StateNotValid => Status::StateNotValid,
            SessionError::SymbolNotFound(_) => Status::SymbolNotFound,
            SessionError::World(_) => Status::StateNotValid,
        }
    }
}
