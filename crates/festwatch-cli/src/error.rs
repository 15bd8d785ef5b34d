use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] festwatch_core::Error),
    #[error(transparent)]
    Api(#[from] festwatch_core::api::ApiError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Film ID cannot be empty")]
    EmptyFilmId,
    #[error("Sync code cannot be empty")]
    EmptySyncCode,
}
