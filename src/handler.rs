use std::{any::Any, collections::BTreeMap, panic::AssertUnwindSafe};

use futures::FutureExt;

use crate::{
    lifecycle::{LifecycleEvent, LifecycleResponse, RequestType},
    store::{ParameterStore, StoreError},
    values::{self, HelmValues},
};

/// Parameter read when `SSM_PARAMETER_NAME` is not set.
pub const DEFAULT_PARAMETER_NAME: &str = "/platform/account/env";

/// Resolves Helm values for each lifecycle event of the custom resource.
pub struct Handler<S> {
    store: S,
    parameter_name: String,
}

impl<S: ParameterStore + Sync> Handler<S> {
    pub fn new(store: S, parameter_name: impl Into<String>) -> Self {
        Self {
            store,
            parameter_name: parameter_name.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    /// Handles a single lifecycle event.
    ///
    /// Never fails: errors, including panics while reading the store,
    /// are reported as a `FAILED` response.
    /// Deletes succeed without touching the store.
    pub async fn handle(&self, event: LifecycleEvent) -> LifecycleResponse {
        log::info!("Received event: {event:?}");

        match event.request_type {
            RequestType::Delete => LifecycleResponse::success(&event, BTreeMap::new()),
            RequestType::Create | RequestType::Update => match self.resolve().await {
                Ok(values) => {
                    let data = BTreeMap::from([(
                        HelmValues::REPLICA_COUNT_ATTRIBUTE.to_owned(),
                        values.replica_count().into(),
                    )]);
                    LifecycleResponse::success(&event, data)
                }
                Err(err) => {
                    log::error!("{err}");
                    LifecycleResponse::failed(&event, err.to_string())
                }
            },
        }
    }

    async fn resolve(&self) -> Result<HelmValues, ResolveError> {
        let read = async {
            let environment = self.store.get(&self.parameter_name).await?;
            log::info!("Environment from store: {environment}");

            let values = values::resolve(&environment);
            log::info!("Helm values: {values:?}");
            Ok::<_, ResolveError>(values)
        };

        match AssertUnwindSafe(read).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(ResolveError::Unexpected(panic_message(panic.as_ref()))),
        }
    }
}

/// Why values could not be resolved for a create or update.
///
/// The display form is used verbatim as the response reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("parameter {name} not found")]
    NotFound { name: String },
    #[error("Error: {0}")]
    Unexpected(String),
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { name } => Self::NotFound { name },
            StoreError::Backend(err) => Self::Unexpected(err.to_string()),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_owned()
    }
}
