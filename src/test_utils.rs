// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses and repo servers.

use async_trait::async_trait;
use http::{Request, Response};
use http_body_util::BodyExt;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::Client;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

use crate::error::{Result, UpgradeRepoError};
use crate::repo::ImageResolver;
use crate::types::image::VirtualMachineImageStatus;
use crate::types::upgrade::UpgradeStatus;
use crate::types::{Condition, Upgrade, UpgradeSpec, VirtualMachineImage, VirtualMachineImageSpec};

#[derive(Default)]
struct MockState {
    responses: HashMap<(String, String), (u16, String)>,
    /// Collection paths that behave like an API server on POST
    stores: HashMap<String, Vec<serde_json::Value>>,
    requests: Vec<(String, String)>,
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    state: Arc<Mutex<MockState>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.state.lock().unwrap().responses.insert(
            ("GET".to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    /// Accept creates on a collection path: the first POST of a name returns
    /// the object, later POSTs of the same name get a 409 Conflict.
    pub fn on_create(self, collection_path: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .stores
            .insert(collection_path.to_string(), Vec::new());
        self
    }

    /// Objects created on a collection path registered with `on_create`
    pub fn created(&self, collection_path: &str) -> Vec<serde_json::Value> {
        self.state
            .lock()
            .unwrap()
            .stores
            .get(collection_path)
            .cloned()
            .unwrap_or_default()
    }

    /// Method and path of every request received so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let state = self.state.lock().unwrap();

        // Try exact match first
        if let Some(resp) = state.responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Try prefix match for paths like /api/v1/namespaces/foo
        for ((m, p), resp) in state.responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(resp.clone());
            }
        }

        None
    }

    fn store_create(&self, path: &str, body: &[u8]) -> Option<(u16, String)> {
        let mut state = self.state.lock().unwrap();
        let store = state.stores.get_mut(path)?;

        let mut object: serde_json::Value = match serde_json::from_slice(body) {
            Ok(object) => object,
            Err(e) => return Some((400, status_json(400, "BadRequest", &e.to_string()))),
        };
        let metadata = &mut object["metadata"];
        if metadata["name"].is_null() {
            let prefix = metadata["generateName"].as_str().unwrap_or_default().to_string();
            metadata["name"] = serde_json::Value::String(format!("{}{:05}", prefix, store.len()));
        }
        let name = metadata["name"].as_str().unwrap_or_default().to_string();
        metadata["uid"] = serde_json::Value::String(format!("uid-{}", name));

        if store.iter().any(|o| o["metadata"]["name"] == name.as_str()) {
            let message = format!("{} \"{}\" already exists", path, name);
            return Some((409, status_json(409, "AlreadyExists", &message)));
        }

        store.push(object.clone());
        Some((201, object.to_string()))
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        self.state
            .lock()
            .unwrap()
            .requests
            .push((method.clone(), path.clone()));

        let mock = self.clone();

        Box::pin(async move {
            let body = req.into_body().collect().await?.to_bytes();

            let response = if method == "POST" {
                mock.store_create(&path, &body)
                    .or_else(|| mock.find_response(&method, &path))
            } else {
                mock.find_response(&method, &path)
            };

            // Default 404 for unmatched requests
            let (status, body) =
                response.unwrap_or_else(|| (404, status_json(404, "NotFound", "not found")));

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a Status response body
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(
        404,
        "NotFound",
        &format!("{} \"{}\" not found", resource, name),
    )
}

/// Create a mock VirtualMachineImage JSON response
pub fn image_json(namespace: &str, name: &str, storage_class: &str) -> String {
    serde_json::to_string(&make_image(namespace, name, storage_class)).unwrap()
}

/// An upgrade as read back from the API server, optionally with a resolved image
pub fn make_upgrade(name: &str, image_id: Option<&str>) -> Upgrade {
    Upgrade {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("harvester-system".to_string()),
            uid: Some(format!("uid-{}", name)),
            ..Default::default()
        },
        spec: UpgradeSpec {
            version: "v1.2.0".to_string(),
            ..Default::default()
        },
        status: Some(UpgradeStatus {
            image_id: image_id.map(str::to_string),
            ..Default::default()
        }),
    }
}

/// An imported image in the given storage class
pub fn make_image(namespace: &str, name: &str, storage_class: &str) -> VirtualMachineImage {
    VirtualMachineImage {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: VirtualMachineImageSpec {
            display_name: format!("{}-display", name),
            url: "http://releases/harvester.iso".to_string(),
            ..Default::default()
        },
        status: Some(VirtualMachineImageStatus {
            storage_class_name: storage_class.to_string(),
            progress: 100,
            conditions: Some(vec![Condition {
                condition_type: "Imported".to_string(),
                status: "True".to_string(),
                reason: None,
                message: None,
            }]),
        }),
    }
}

/// In-memory image resolver counting its lookups
#[derive(Clone, Default)]
pub struct FakeImageResolver {
    images: BTreeMap<(String, String), VirtualMachineImage>,
    lookups: Arc<AtomicUsize>,
}

impl FakeImageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, namespace: &str, name: &str, storage_class: &str) -> Self {
        self.images.insert(
            (namespace.to_string(), name.to_string()),
            make_image(namespace, name, storage_class),
        );
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageResolver for FakeImageResolver {
    async fn resolve(&self, namespace: &str, name: &str) -> Result<VirtualMachineImage> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.images
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| UpgradeRepoError::ImageNotFound(format!("{}/{}", namespace, name)))
    }
}

/// Serve a router on a random local port
pub async fn serve(router: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A local port nothing listens on
pub async fn unused_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
