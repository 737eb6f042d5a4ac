use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Metadata lookup failed: {0}")]
    LookupFailed(String),

    #[error("Metadata endpoint returned HTTP {status}")]
    HttpError { status: u16 },

    #[error("Invalid source document: {0}")]
    InvalidSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
