use thiserror::Error;

pub type DeviceResult<T> = Result<T, DeviceError>;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("boot config error: {0}")]
    Boot(String),

    #[error("resource error: {0}")]
    Resource(#[from] coronet_resource::ResourceError),

    #[error("console error: {0}")]
    Console(#[from] coronet_console::ConsoleError),

    #[error("game error [{game}]: {source}")]
    Game {
        game: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
