// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! "Open a tunnel to this service" for higher-level commands

use crate::config::Config;
use crate::error::{Result, TunnelError};
use crate::kubernetes::pods::{PodSelector, PreferRunning, SelectionStrategy};
use crate::kubernetes::portforward::KubeForwarderFactory;
use crate::kubernetes::services::fetch_service;
use crate::tunnel::handle::TunnelHandle;
use crate::tunnel::ports::resolve_target_port;
use crate::tunnel::supervisor::{ForwardTarget, ForwarderFactory, TunnelSupervisor};
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Discovers the pod behind a service and forwards a local port to it.
///
/// Every `open` fetches the service and its pods afresh; nothing is cached or
/// shared between invocations.
pub struct ServiceTunnel<F = KubeForwarderFactory, S = PreferRunning> {
    client: Client,
    pods: PodSelector<S>,
    supervisor: TunnelSupervisor<F>,
}

impl ServiceTunnel {
    pub fn new(client: Client, config: &Config) -> Self {
        let factory = KubeForwarderFactory::new(client.clone(), config.bind_address);
        Self::with_parts(
            client.clone(),
            PodSelector::new(client),
            TunnelSupervisor::new(factory).with_timeout(config.ready_timeout),
        )
    }
}

impl<F: ForwarderFactory, S: SelectionStrategy> ServiceTunnel<F, S> {
    pub fn with_parts(client: Client, pods: PodSelector<S>, supervisor: TunnelSupervisor<F>) -> Self {
        Self {
            client,
            pods,
            supervisor,
        }
    }

    /// Open a tunnel from `local_port` to `service_port` of `namespace/service`.
    #[instrument(skip(self, cancel))]
    pub async fn open(
        &self,
        namespace: &str,
        service: &str,
        local_port: u16,
        service_port: u16,
        cancel: &CancellationToken,
    ) -> Result<TunnelHandle> {
        let target = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(TunnelError::Cancelled {
                    namespace: namespace.to_string(),
                    service: service.to_string(),
                });
            }
            target = self.discover(namespace, service, local_port, service_port) => target?,
        };

        self.supervisor.establish(target, cancel).await
    }

    async fn discover(
        &self,
        namespace: &str,
        service: &str,
        local_port: u16,
        service_port: u16,
    ) -> Result<ForwardTarget> {
        let descriptor = fetch_service(&self.client, namespace, service).await?;
        let pod = self.pods.select(&descriptor).await?;
        let resolved = resolve_target_port(&descriptor, service_port, &pod)?;

        let remote_port = u16::try_from(resolved)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| TunnelError::DialFailed {
                pod: pod.name.clone(),
                reason: format!("resolved port {} is not a valid TCP port", resolved),
            })?;

        info!(
            "Service {}/{} port {} is served by pod {} on port {}",
            namespace, service, service_port, pod.name, remote_port
        );

        Ok(ForwardTarget {
            namespace: descriptor.namespace,
            service: descriptor.name,
            pod: pod.name,
            local_port,
            remote_port,
        })
    }
}
