// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TunnelError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Service {namespace}/{service} not found")]
    ServiceNotFound { namespace: String, service: String },

    #[error("Service {namespace}/{service} has no selector")]
    SelectorRejected { namespace: String, service: String },

    #[error("No pods found in namespace {namespace} for service selector {selector}")]
    PodNotFound { namespace: String, selector: String },

    #[error(
        "Service {namespace}/{service} targetPort {port_name:?} not found in pod {pod} (service port {service_port})"
    )]
    PortUnresolved {
        namespace: String,
        service: String,
        port_name: String,
        pod: String,
        service_port: u16,
    },

    #[error("Failed to establish port-forward to pod {pod}: {reason}")]
    DialFailed { pod: String, reason: String },

    #[error("Port-forward session to pod {pod} ended unexpectedly")]
    SessionClosed { pod: String },

    #[error("Port-forward timeout for service {namespace}/{service}")]
    Timeout { namespace: String, service: String },

    #[error("Port-forward to service {namespace}/{service} cancelled")]
    Cancelled { namespace: String, service: String },
}

impl TunnelError {
    /// Whether a caller may reasonably retry, possibly through another path.
    /// Configuration inconsistencies and cancellation are final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TunnelError::KubeError(_)
                | TunnelError::DialFailed { .. }
                | TunnelError::SessionClosed { .. }
                | TunnelError::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TunnelError>;
