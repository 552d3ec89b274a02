//! Key-value configuration stores the environment setting can be read from.

use std::{error::Error as StdError, future::Future};

/// Read access to named parameters.
pub trait ParameterStore {
    /// Reads the current value of the parameter `name`.
    fn get(&self, name: &str) -> impl Future<Output = Result<String, StoreError>> + Send;
}

/// The error type returned by [`ParameterStore::get`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The parameter does not exist in the store.
    #[error("parameter {name} not found")]
    NotFound { name: String },
    /// The store could not be queried or returned an unusable response.
    #[error("{0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

impl StoreError {
    pub fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_owned(),
        }
    }

    pub fn backend(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }
}

pub mod config_map;
pub use config_map::ConfigMapStore;
pub mod memory;
pub use memory::MemoryStore;
pub mod ssm;
pub use ssm::SsmParameterStore;
