// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Port-forward sessions over the pod `portforward` sub-resource

use crate::constants::portforward::{
    ACCEPT_BACKOFF_MAX_MILLIS, ACCEPT_BACKOFF_MILLIS, MAX_ACCEPT_FAILURES,
};
use crate::error::{Result, TunnelError};
use crate::tunnel::supervisor::{ForwardTarget, Forwarder, ForwarderFactory};
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{copy_bidirectional, AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// A bidirectional byte stream to a pod port
pub trait UpstreamStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> UpstreamStream for T {}

/// Opens one upstream connection to a port of a pod
pub trait PodDialer: Clone + Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    fn dial(&self, pod: &str, port: u16) -> impl Future<Output = Result<Self::Stream>> + Send;
}

/// Dials through the websocket-upgraded `portforward` sub-resource
#[derive(Clone)]
pub struct KubeDialer {
    pods: Api<Pod>,
}

impl KubeDialer {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            pods: Api::namespaced(client, namespace),
        }
    }
}

impl PodDialer for KubeDialer {
    type Stream = Box<dyn UpstreamStream>;

    async fn dial(&self, pod: &str, port: u16) -> Result<Self::Stream> {
        let dial_failed = |reason: String| TunnelError::DialFailed {
            pod: pod.to_string(),
            reason,
        };

        let mut forwarder = self
            .pods
            .portforward(pod, &[port])
            .await
            .map_err(|e| dial_failed(e.to_string()))?;
        let upstream = forwarder
            .take_stream(port)
            .ok_or_else(|| dial_failed(format!("no stream for port {}", port)))?;
        let remote_error = forwarder.take_error(port);

        // The upgraded connection lives until the stream is dropped
        let pod = pod.to_string();
        tokio::spawn(async move {
            let joined = forwarder.join().await;
            if let Some(remote_error) = remote_error {
                if let Some(message) = remote_error.await {
                    warn!("Pod {} reported a port-forward error on port {}: {}", pod, port, message);
                }
            }
            if let Err(e) = joined {
                debug!("Port-forward connection to pod {} ended: {}", pod, e);
            }
        });

        Ok(Box::new(upstream))
    }
}

/// Creates `PodForwarder`s listening on `bind_address`
#[derive(Clone)]
pub struct KubeForwarderFactory {
    client: Client,
    bind_address: IpAddr,
}

impl KubeForwarderFactory {
    pub fn new(client: Client, bind_address: IpAddr) -> Self {
        Self {
            client,
            bind_address,
        }
    }
}

impl ForwarderFactory for KubeForwarderFactory {
    type Forwarder = PodForwarder;

    fn forwarder(&self, target: &ForwardTarget) -> Result<PodForwarder> {
        Ok(PodForwarder::new(
            KubeDialer::new(self.client.clone(), &target.namespace),
            &target.pod,
            SocketAddr::new(self.bind_address, target.local_port),
            target.remote_port,
        ))
    }
}

/// Listens locally and relays every accepted connection to a pod port through
/// its own upstream connection.
pub struct PodForwarder<D = KubeDialer> {
    dialer: D,
    pod: String,
    local: SocketAddr,
    remote_port: u16,
}

impl<D: PodDialer> PodForwarder<D> {
    pub fn new(dialer: D, pod: &str, local: SocketAddr, remote_port: u16) -> Self {
        Self {
            dialer,
            pod: pod.to_string(),
            local,
            remote_port,
        }
    }
}

impl<D: PodDialer> Forwarder for PodForwarder<D> {
    #[instrument(skip_all, fields(pod = %self.pod, local = %self.local, remote_port = self.remote_port))]
    async fn run(
        self,
        ready: oneshot::Sender<SocketAddr>,
        stop: CancellationToken,
    ) -> Result<()> {
        let listener = TcpListener::bind(self.local)
            .await
            .map_err(|e| TunnelError::DialFailed {
                pod: self.pod.clone(),
                reason: format!("failed to listen on {}: {}", self.local, e),
            })?;
        let local_addr = listener.local_addr().map_err(|e| TunnelError::DialFailed {
            pod: self.pod.clone(),
            reason: format!("failed to read listener address: {}", e),
        })?;

        if ready.send(local_addr).is_err() {
            debug!("Supervisor stopped waiting before the listener was ready");
            return Ok(());
        }

        let mut connections = JoinSet::new();
        let mut backoff = AcceptBackoff::new();
        let outcome = loop {
            tokio::select! {
                _ = stop.cancelled() => break Ok(()),
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        backoff.reset();
                        debug!("Accepted connection from {}", peer);
                        connections.spawn(relay(
                            self.dialer.clone(),
                            self.pod.clone(),
                            self.remote_port,
                            socket,
                        ));
                    }
                    Err(e) => match backoff.failed() {
                        Some(delay) => {
                            warn!(
                                "Failed to accept connection on {}: {}, retrying in {:?}",
                                local_addr, e, delay
                            );
                            tokio::select! {
                                _ = stop.cancelled() => break Ok(()),
                                _ = tokio::time::sleep(delay) => {}
                            }
                        }
                        None => {
                            error!("Giving up on listener {} after repeated accept failures", local_addr);
                            break Err(TunnelError::DialFailed {
                                pod: self.pod.clone(),
                                reason: format!("accepting on {} keeps failing: {}", local_addr, e),
                            });
                        }
                    },
                },
                Some(finished) = connections.join_next(), if !connections.is_empty() => match finished {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("Connection relay failed: {}", e),
                    Err(e) if e.is_panic() => error!("Connection relay panicked: {}", e),
                    Err(_) => {}
                },
            }
        };

        connections.shutdown().await;
        info!("Port-forward to pod {} stopped", self.pod);
        outcome
    }
}

/// Exponential pause between failed accepts, giving up after too many in a row
struct AcceptBackoff {
    failures: u32,
    delay: Duration,
}

impl AcceptBackoff {
    fn new() -> Self {
        Self {
            failures: 0,
            delay: Duration::from_millis(ACCEPT_BACKOFF_MILLIS),
        }
    }

    /// Record a failed accept. Returns the pause before the next attempt, or
    /// `None` once the listener should be considered broken.
    fn failed(&mut self) -> Option<Duration> {
        self.failures += 1;
        if self.failures >= MAX_ACCEPT_FAILURES {
            return None;
        }
        let delay = self.delay;
        self.delay = (self.delay * 2).min(Duration::from_millis(ACCEPT_BACKOFF_MAX_MILLIS));
        Some(delay)
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Relay one local connection to the pod until either side closes
async fn relay<D: PodDialer>(dialer: D, pod: String, port: u16, mut socket: TcpStream) -> Result<()> {
    let mut upstream = dialer.dial(&pod, port).await?;

    match copy_bidirectional(&mut socket, &mut upstream).await {
        Ok((sent, received)) => debug!("Connection closed: {} bytes sent, {} received", sent, received),
        Err(e) => debug!("Connection closed: {}", e),
    }

    Ok(())
}
