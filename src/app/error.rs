use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::delivery::DeliveryError;
use crate::fetcher::FetchError;
use crate::store::StateError;

#[derive(Error, Debug)]
pub enum CourierError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("State file {} is locked by another run", .0.display())]
    Locked(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CourierError>;
