use aws_sdk_ssm::{error::DisplayErrorContext, operation::get_parameter::GetParameterError, Client};

use super::{ParameterStore, StoreError};

/// Reads parameters from AWS Systems Manager Parameter Store.
#[derive(Debug, Clone)]
pub struct SsmParameterStore {
    client: Client,
}

impl SsmParameterStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the ambient AWS configuration (region, credentials).
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config))
    }
}

impl ParameterStore for SsmParameterStore {
    async fn get(&self, name: &str) -> Result<String, StoreError> {
        let output = self
            .client
            .get_parameter()
            .name(name)
            .send()
            .await
            .map_err(|err| match err.into_service_error() {
                GetParameterError::ParameterNotFound(_) => StoreError::not_found(name),
                err => StoreError::backend(DisplayErrorContext(err).to_string()),
            })?;

        output
            .parameter()
            .and_then(|parameter| parameter.value())
            .map(str::to_owned)
            .ok_or_else(|| StoreError::backend(format!("parameter {name} has no value")))
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_ssm::{
        operation::get_parameter::{GetParameterError, GetParameterOutput},
        types::{error::ParameterNotFound, Parameter},
        Client,
    };
    use aws_smithy_mocks::{mock, mock_client};

    use super::SsmParameterStore;
    use crate::store::{ParameterStore, StoreError};

    const NAME: &str = "/platform/account/env";

    #[tokio::test]
    async fn returns_parameter_value() {
        let rule = mock!(Client::get_parameter)
            .match_requests(|req| req.name() == Some(NAME))
            .then_output(|| {
                GetParameterOutput::builder()
                    .parameter(Parameter::builder().name(NAME).value("staging").build())
                    .build()
            });
        let store = SsmParameterStore::new(mock_client!(aws_sdk_ssm, [&rule]));

        assert_eq!(store.get(NAME).await.unwrap(), "staging");
    }

    #[tokio::test]
    async fn missing_parameter_is_not_found() {
        let rule = mock!(Client::get_parameter).then_error(|| {
            GetParameterError::ParameterNotFound(ParameterNotFound::builder().build())
        });
        let store = SsmParameterStore::new(mock_client!(aws_sdk_ssm, [&rule]));

        match store.get(NAME).await {
            Err(StoreError::NotFound { name }) => assert_eq!(name, NAME),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn parameter_without_value_is_backend_error() {
        let rule = mock!(Client::get_parameter).then_output(|| {
            GetParameterOutput::builder()
                .parameter(Parameter::builder().name(NAME).build())
                .build()
        });
        let store = SsmParameterStore::new(mock_client!(aws_sdk_ssm, [&rule]));

        match store.get(NAME).await {
            Err(err @ StoreError::Backend(_)) => {
                assert_eq!(err.to_string(), format!("parameter {NAME} has no value"));
            }
            other => panic!("expected Backend, got {other:?}"),
        }
    }
}
