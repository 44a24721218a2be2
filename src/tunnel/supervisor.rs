// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Port-forward session lifecycle: start, wait for readiness, stop.

use crate::constants::portforward::TIMEOUT_SECS;
use crate::error::{Result, TunnelError};
use crate::tunnel::handle::{StopControl, TunnelHandle};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Everything needed to forward a local port to one pod
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardTarget {
    pub namespace: String,
    pub service: String,
    pub pod: String,
    pub local_port: u16,
    pub remote_port: u16,
}

/// The I/O loop of one forwarding session.
pub trait Forwarder: Send + 'static {
    /// Relay traffic until `stop` is cancelled. The local address is sent on
    /// `ready` once connections are being accepted.
    fn run(
        self,
        ready: oneshot::Sender<SocketAddr>,
        stop: CancellationToken,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Prepares forwarding sessions. Failing here fails establishment immediately.
pub trait ForwarderFactory: Send + Sync {
    type Forwarder: Forwarder;

    fn forwarder(&self, target: &ForwardTarget) -> Result<Self::Forwarder>;
}

/// Brings up a forwarding session and waits, bounded, until it is usable
pub struct TunnelSupervisor<F> {
    factory: F,
    timeout: Duration,
}

impl<F: ForwarderFactory> TunnelSupervisor<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            timeout: Duration::from_secs(TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Start a session and race readiness against `cancel` and the timeout.
    ///
    /// The session stops when the returned handle is stopped or dropped, or when
    /// `cancel` fires. On any failure the session has already been told to stop.
    #[instrument(skip(self, target, cancel), fields(namespace = %target.namespace, service = %target.service, pod = %target.pod))]
    pub async fn establish(
        &self,
        target: ForwardTarget,
        cancel: &CancellationToken,
    ) -> Result<TunnelHandle> {
        let forwarder = self.factory.forwarder(&target)?;

        let stop = StopControl::new(cancel.child_token());
        let (ready_tx, ready_rx) = oneshot::channel();
        let session = tokio::spawn(forwarder.run(ready_tx, stop.token()));
        let deadline = Instant::now() + self.timeout;

        debug!(
            "Waiting up to {:?} for port-forward {} -> {}:{}",
            self.timeout, target.local_port, target.pod, target.remote_port
        );

        // Cancellation is checked first so a cancelled caller never gets a handle
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                stop.stop();
                debug!("Port-forward cancelled before becoming ready");
                Err(TunnelError::Cancelled {
                    namespace: target.namespace,
                    service: target.service,
                })
            }
            ready = ready_rx => match ready {
                Ok(local_addr) => {
                    info!(
                        "Forwarding {} -> {}/{}:{}",
                        local_addr, target.namespace, target.pod, target.remote_port
                    );
                    Ok(TunnelHandle::new(local_addr, target, stop, session))
                }
                Err(_) => {
                    stop.stop();
                    match tokio::time::timeout_at(deadline, session).await {
                        Ok(Ok(Err(e))) => {
                            warn!("Port-forward session failed before becoming ready: {}", e);
                            Err(e)
                        }
                        Ok(_) => Err(TunnelError::SessionClosed { pod: target.pod }),
                        Err(_) => {
                            warn!("Port-forward session did not exit after {:?}", self.timeout);
                            Err(TunnelError::Timeout {
                                namespace: target.namespace,
                                service: target.service,
                            })
                        }
                    }
                }
            },
            _ = tokio::time::sleep_until(deadline) => {
                stop.stop();
                warn!("Port-forward not ready after {:?}", self.timeout);
                Err(TunnelError::Timeout {
                    namespace: target.namespace,
                    service: target.service,
                })
            }
        }
    }
}
