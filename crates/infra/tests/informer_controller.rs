//! Informer and controller wired together against a mock API server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use levelset_common::testing::poll_until;
use levelset_core::{Controller, ReconcileError, Reconciler};
use levelset_domain::{ClientConfig, ControllerConfig, InformerConfig, Resource, ResourceKey};
use levelset_infra::{ApiClient, ClientError, Informer, ListSource};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingReconciler {
    seen: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingReconciler {
    fn seen(&self) -> Vec<(String, Option<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reconciler for RecordingReconciler {
    async fn reconcile(
        &self,
        key: &ResourceKey,
        object: Option<Resource>,
    ) -> Result<(), ReconcileError> {
        let version = object.map(|o| o.resource_version().to_string());
        self.seen.lock().unwrap().push((key.to_string(), version));
        Ok(())
    }
}

fn pod_list(pods: &[(&str, &str)]) -> serde_json::Value {
    let items: Vec<_> = pods
        .iter()
        .map(|(name, version)| {
            json!({
                "metadata": { "name": name, "namespace": "default", "resourceVersion": version },
                "spec": { "containers": [{ "name": "app", "image": "nginx" }] }
            })
        })
        .collect();
    json!({
        "kind": "PodList",
        "apiVersion": "v1",
        "metadata": { "resourceVersion": "100" },
        "items": items
    })
}

async fn mount_pods(server: &MockServer, pods: &[(&str, &str)]) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/default/pods"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pod_list(pods)))
        .mount(server)
        .await;
}

fn api_client(server: &MockServer) -> ApiClient {
    let config = ClientConfig {
        server_url: server.uri(),
        token: Some("test-token".into()),
        ..ClientConfig::default()
    };
    ApiClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_api_client_lists_namespace_pods() {
    let server = MockServer::start().await;
    mount_pods(&server, &[("web-1", "11"), ("web-2", "12")]).await;

    let list = api_client(&server).list("default").await.unwrap();

    assert_eq!(list.metadata.resource_version, "100");
    let names: Vec<_> = list.items.iter().map(Resource::name).collect();
    assert_eq!(names, vec!["web-1", "web-2"]);
}

#[tokio::test]
async fn test_api_client_maps_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let result = api_client(&server).list("default").await;

    assert!(matches!(result, Err(ClientError::Auth(msg)) if msg.contains("token expired")));
}

#[tokio::test]
async fn test_api_client_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = api_client(&server).list("default").await;

    assert!(matches!(result, Err(ClientError::Decode(_))));
}

#[tokio::test]
async fn test_listed_pods_are_reconciled_and_deletions_seen() {
    let server = MockServer::start().await;
    mount_pods(&server, &[("web-1", "11"), ("web-2", "12")]).await;

    let informer_config = InformerConfig { resync_interval_secs: 1, ..InformerConfig::default() };
    let informer = Arc::new(Informer::new(Arc::new(api_client(&server)), &informer_config));
    let reconciler = Arc::new(RecordingReconciler::default());
    let controller = Arc::new(
        Controller::new(
            Arc::new(()),
            &*informer,
            informer.mirror(),
            reconciler.clone(),
            ControllerConfig { workers: 2, ..ControllerConfig::default() },
        )
        .unwrap(),
    );

    let stop = CancellationToken::new();
    let informer_task = tokio::spawn(Arc::clone(&informer).run(stop.clone()));
    let controller_task = tokio::spawn(Arc::clone(&controller).run(stop.clone()));

    let observed = reconciler.clone();
    assert!(
        poll_until(Duration::from_secs(5), Duration::from_millis(20), || {
            let observed = observed.clone();
            async move {
                let seen = observed.seen();
                ["default/web-1", "default/web-2"]
                    .iter()
                    .all(|key| seen.iter().any(|(k, v)| k == key && v.is_some()))
            }
        })
        .await
    );

    mount_pods(&server, &[("web-1", "13")]).await;

    let observed = reconciler.clone();
    assert!(
        poll_until(Duration::from_secs(5), Duration::from_millis(20), || {
            let observed = observed.clone();
            async move {
                let seen = observed.seen();
                seen.iter().any(|(k, v)| k == "default/web-2" && v.is_none())
                    && seen.iter().any(|(k, v)| k == "default/web-1" && v.as_deref() == Some("13"))
            }
        })
        .await
    );

    stop.cancel();
    informer_task.await.unwrap();
    assert!(controller_task.await.unwrap().is_ok());
    assert_eq!(controller.stats().dropped, 0);
}
