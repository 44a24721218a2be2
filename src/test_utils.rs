// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for faking the Kubernetes API and forwarding sessions.

use crate::error::{Result as TunnelResult, TunnelError};
use crate::tunnel::supervisor::{ForwardTarget, Forwarder, ForwarderFactory};
use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths
/// and remembers every request it served.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(("GET".to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Requests served so far, as `METHOD path?query`
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
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
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_else(|| path.clone());

        self.requests
            .lock()
            .unwrap()
            .push(format!("{} {}", method, path_and_query));

        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) = response.unwrap_or_else(|| (404, not_found_json("resource", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock Service JSON response. Targets are either numbers or names.
pub fn service_json(
    namespace: &str,
    name: &str,
    ports: &[(i32, serde_json::Value)],
    selector: &[(&str, &str)],
) -> String {
    let ports: Vec<_> = ports
        .iter()
        .map(|(port, target)| serde_json::json!({ "port": port, "targetPort": target }))
        .collect();
    let selector: serde_json::Map<_, _> = selector
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
        .collect();

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "ports": ports, "selector": selector }
    })
    .to_string()
}

/// Create a mock Pod JSON object with a single container
pub fn pod_json(namespace: &str, name: &str, phase: &str, ports: &[(&str, i32)]) -> serde_json::Value {
    let ports: Vec<_> = ports
        .iter()
        .map(|(port_name, number)| serde_json::json!({ "name": port_name, "containerPort": number }))
        .collect();

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "containers": [{ "name": "main", "ports": ports }] },
        "status": { "phase": phase }
    })
}

/// Create a mock PodList JSON response
pub fn pod_list_json(pods: Vec<serde_json::Value>) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "PodList",
        "metadata": { "resourceVersion": "1" },
        "items": pods
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// How a `FakeForwarder` session behaves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FakeBehavior {
    /// Report ready on 127.0.0.1:<local port>, then wait for stop
    Ready,
    /// Never report ready, only wait for stop
    NeverReady,
    /// Fail before reporting ready
    FailInSession,
    /// Drop the readiness sender and then ignore the stop signal
    DropReadyAndHang,
    /// Refuse to create a session at all
    RejectTarget,
}

/// A forwarder factory that records targets and counts stop signals
#[derive(Clone)]
pub struct FakeFactory {
    behavior: FakeBehavior,
    targets: Arc<Mutex<Vec<ForwardTarget>>>,
    stop_signals: Arc<AtomicUsize>,
    running: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            targets: Arc::new(Mutex::new(Vec::new())),
            stop_signals: Arc::new(AtomicUsize::new(0)),
            running: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn targets(&self) -> Vec<ForwardTarget> {
        self.targets.lock().unwrap().clone()
    }

    /// Number of stop signals observed by all sessions
    pub fn stop_signals(&self) -> usize {
        self.stop_signals.load(Ordering::SeqCst)
    }

    pub fn running_sessions(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Wait (bounded) until sessions have observed `count` stop signals
    pub async fn wait_for_stop_signals(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.stop_signals() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("session never observed the stop signal");
    }
}

impl ForwarderFactory for FakeFactory {
    type Forwarder = FakeForwarder;

    fn forwarder(&self, target: &ForwardTarget) -> TunnelResult<FakeForwarder> {
        if self.behavior == FakeBehavior::RejectTarget {
            return Err(TunnelError::DialFailed {
                pod: target.pod.clone(),
                reason: "rejected by fake".to_string(),
            });
        }
        self.targets.lock().unwrap().push(target.clone());
        Ok(FakeForwarder {
            behavior: self.behavior,
            target: target.clone(),
            stop_signals: self.stop_signals.clone(),
            running: self.running.clone(),
        })
    }
}

pub struct FakeForwarder {
    behavior: FakeBehavior,
    target: ForwardTarget,
    stop_signals: Arc<AtomicUsize>,
    running: Arc<AtomicUsize>,
}

impl Forwarder for FakeForwarder {
    async fn run(
        self,
        ready: oneshot::Sender<SocketAddr>,
        stop: CancellationToken,
    ) -> TunnelResult<()> {
        if self.behavior == FakeBehavior::FailInSession {
            return Err(TunnelError::DialFailed {
                pod: self.target.pod,
                reason: "session failed in fake".to_string(),
            });
        }

        if self.behavior == FakeBehavior::DropReadyAndHang {
            drop(ready);
            std::future::pending::<()>().await;
            return Ok(());
        }

        self.running.fetch_add(1, Ordering::SeqCst);
        // Keep the sender alive while waiting so readiness never fires
        let _pending = if self.behavior == FakeBehavior::Ready {
            let _ = ready.send(SocketAddr::from((Ipv4Addr::LOCALHOST, self.target.local_port)));
            None
        } else {
            Some(ready)
        };

        stop.cancelled().await;
        self.stop_signals.fetch_add(1, Ordering::SeqCst);
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
