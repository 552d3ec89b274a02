//! Request and response records exchanged with the CloudFormation custom resource provider.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Physical id reported when the request does not carry one yet.
pub const DEFAULT_PHYSICAL_RESOURCE_ID: &str = "HelmValuesGenerator";

/// The lifecycle operation requested.
///
/// Any other value fails deserialization, so the runtime reports an
/// invocation error instead of a structured response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// A lifecycle event delivered for the custom resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    pub request_id: String,
    pub stack_id: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: serde_json::Map<String, serde_json::Value>,
}

impl LifecycleEvent {
    pub fn physical_resource_id(&self) -> &str {
        self.physical_resource_id
            .as_deref()
            .unwrap_or(DEFAULT_PHYSICAL_RESOURCE_ID)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Failed,
}

/// The response returned for each [`LifecycleEvent`].
///
/// `data` is only present on success and `reason` only on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleResponse {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, serde_json::Value>>,
}

impl LifecycleResponse {
    pub fn success(event: &LifecycleEvent, data: BTreeMap<String, serde_json::Value>) -> Self {
        Self {
            status: Status::Success,
            reason: None,
            data: Some(data),
            ..Self::echo(event)
        }
    }

    pub fn failed(event: &LifecycleEvent, reason: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            reason: Some(reason.into()),
            data: None,
            ..Self::echo(event)
        }
    }

    fn echo(event: &LifecycleEvent) -> Self {
        Self {
            status: Status::Success,
            reason: None,
            physical_resource_id: event.physical_resource_id().to_owned(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            data: None,
        }
    }
}
