use k8s_openapi::api::core::v1::ConfigMap;
use kube_client::{Api, Client};

use super::{ParameterStore, StoreError};

/// Reads parameters from the data of a single ConfigMap.
///
/// Parameter paths are not valid ConfigMap keys,
/// so each path is looked up under [`data_key`].
#[derive(Clone)]
pub struct ConfigMapStore {
    api: Api<ConfigMap>,
    config_map: String,
}

impl ConfigMapStore {
    pub fn new(client: Client, namespace: &str, config_map: impl Into<String>) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            config_map: config_map.into(),
        }
    }
}

/// Maps a parameter path such as `/platform/account/env` to the key `platform.account.env`.
pub fn data_key(parameter: &str) -> String {
    parameter.trim_start_matches('/').replace('/', ".")
}

impl ParameterStore for ConfigMapStore {
    async fn get(&self, name: &str) -> Result<String, StoreError> {
        let config_map = self
            .api
            .get_opt(&self.config_map)
            .await
            .map_err(StoreError::backend)?;

        let key = data_key(name);
        config_map
            .and_then(|config_map| config_map.data)
            .and_then(|mut data| data.remove(&key))
            .ok_or_else(|| StoreError::not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use http::{Request, Response, StatusCode};
    use k8s_openapi::api::core::v1::ConfigMap;
    use kube_client::{client::Body, Client};
    use tower_test::mock;

    use super::{data_key, ConfigMapStore};
    use crate::store::{ParameterStore, StoreError};

    const PATH: &str = "/api/v1/namespaces/platform/configmaps/platform-account";

    /// Serves a single request on `PATH` with the given status and JSON body.
    fn store_answering(
        status: StatusCode,
        body: serde_json::Value,
    ) -> (ConfigMapStore, tokio::task::JoinHandle<()>) {
        let (service, mut handle) = mock::pair::<Request<Body>, Response<Body>>();
        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.expect("no request sent");
            assert_eq!(request.uri().path(), PATH);
            send.send_response(
                Response::builder()
                    .status(status)
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            );
        });
        let client = Client::new(service, "default");
        let store = ConfigMapStore::new(client, "platform", "platform-account");
        (store, server)
    }

    fn config_map(data: &[(&str, &str)]) -> serde_json::Value {
        let config_map = ConfigMap {
            data: Some(
                data.iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        };
        serde_json::to_value(config_map).unwrap()
    }

    #[test]
    fn parameter_paths_become_keys() {
        assert_eq!(data_key("/platform/account/env"), "platform.account.env");
        assert_eq!(data_key("env"), "env");
    }

    #[tokio::test]
    async fn reads_mapped_key() {
        let (store, server) = store_answering(
            StatusCode::OK,
            config_map(&[("platform.account.env", "production")]),
        );

        assert_eq!(store.get("/platform/account/env").await.unwrap(), "production");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let (store, server) = store_answering(StatusCode::OK, config_map(&[("other", "x")]));

        match store.get("/platform/account/env").await {
            Err(StoreError::NotFound { name }) => assert_eq!(name, "/platform/account/env"),
            other => panic!("expected NotFound, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn missing_config_map_is_not_found() {
        let (store, server) = store_answering(
            StatusCode::NOT_FOUND,
            serde_json::json!({
                "kind": "Status",
                "apiVersion": "v1",
                "metadata": {},
                "status": "Failure",
                "message": "configmaps \"platform-account\" not found",
                "reason": "NotFound",
                "code": 404,
            }),
        );

        assert!(matches!(
            store.get("/platform/account/env").await,
            Err(StoreError::NotFound { .. })
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn server_error_is_backend_error() {
        let (store, server) = store_answering(
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({
                "kind": "Status",
                "apiVersion": "v1",
                "metadata": {},
                "status": "Failure",
                "message": "etcdserver: request timed out",
                "reason": "InternalError",
                "code": 500,
            }),
        );

        assert!(matches!(
            store.get("/platform/account/env").await,
            Err(StoreError::Backend(_))
        ));
        server.await.unwrap();
    }
}
