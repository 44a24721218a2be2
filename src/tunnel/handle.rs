// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Live tunnel handles

use crate::error::{Result, TunnelError};
use crate::tunnel::supervisor::ForwardTarget;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Stops a forwarding session. Only the first `stop` call signals the session;
/// clones share that state.
#[derive(Clone, Debug)]
pub struct StopControl {
    token: CancellationToken,
    signalled: Arc<AtomicBool>,
}

impl StopControl {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            token,
            signalled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask the session to stop. Returns `true` only for the call that did so.
    pub fn stop(&self) -> bool {
        if self.signalled.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Whether the session has been asked to stop, either through this control
    /// or because the caller's cancellation fired.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// A ready port-forward session. Dropping the handle stops the session.
#[derive(Debug)]
pub struct TunnelHandle {
    local_addr: SocketAddr,
    target: ForwardTarget,
    stop: StopControl,
    session: Option<JoinHandle<Result<()>>>,
}

impl TunnelHandle {
    pub(crate) fn new(
        local_addr: SocketAddr,
        target: ForwardTarget,
        stop: StopControl,
        session: JoinHandle<Result<()>>,
    ) -> Self {
        Self {
            local_addr,
            target,
            stop,
            session: Some(session),
        }
    }

    /// Local address now accepting connections
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn pod_name(&self) -> &str {
        &self.target.pod
    }

    /// Concrete container port traffic is relayed to
    pub fn remote_port(&self) -> u16 {
        self.target.remote_port
    }

    pub fn target(&self) -> &ForwardTarget {
        &self.target
    }

    /// A control that can stop the session from elsewhere, e.g. a signal handler
    pub fn stop_control(&self) -> StopControl {
        self.stop.clone()
    }

    pub fn stop(&self) -> bool {
        self.stop.stop()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Wait until the session is asked to stop
    pub async fn stopped(&self) {
        self.stop.token.cancelled().await
    }

    /// Stop the session and wait for its I/O loop to exit
    pub async fn shutdown(mut self) -> Result<()> {
        self.stop.stop();

        let Some(session) = self.session.take() else {
            return Ok(());
        };

        match session.await {
            Ok(result) => {
                debug!("Port-forward session to pod {} exited", self.target.pod);
                result
            }
            Err(e) => {
                debug!("Port-forward session to pod {} aborted: {}", self.target.pod, e);
                Err(TunnelError::SessionClosed {
                    pod: self.target.pod.clone(),
                })
            }
        }
    }
}

impl Drop for TunnelHandle {
    fn drop(&mut self) {
        self.stop.stop();
    }
}
