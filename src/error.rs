use std::io;
use std::path::PathBuf;

/// All error types for the decimation pipeline and scene export.
#[derive(thiserror::Error, Debug)]
pub enum DecimateError {
    #[error("Input error: {0}")]
    Input(String),
    #[error("Directory error at {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Simplification error: {0}")]
    Simplify(String),
    #[error("Output error: {0}")]
    Output(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DecimateError>;
