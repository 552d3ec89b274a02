//! helm-values-resolver backs a CloudFormation custom resource
//! that sizes the ingress-nginx release of an EKS cluster
//! according to the deployment environment stored in a parameter store.
//!
//! On create and update, the [`Handler`] reads the environment setting
//! (`development`, `staging` or `production`) and returns the replica count
//! as the `HelmValues.controller.replicaCount` attribute,
//! which the chart installation of the [`Stack`](stack::Stack) references.
//! Deletes always succeed without reading the store.

pub mod config;
pub use config::Config;
mod handler;
pub use handler::{Handler, ResolveError, DEFAULT_PARAMETER_NAME};
pub mod lifecycle;
pub mod stack;
pub mod store;
pub mod values;
pub use values::{resolve, Environment, HelmValues};
