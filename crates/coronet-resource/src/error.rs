use thiserror::Error;

use coronet_fs::FsError;

pub type ResourceResult<T> = Result<T, ResourceError>;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("package '{package}' manifest error: {reason}")]
    Manifest { package: String, reason: String },

    #[error("resource not managed: '{path}'")]
    NotManaged { path: String },

    #[error("spawn resource loader: {0}")]
    LoaderSpawn(std::io::Error),
}
