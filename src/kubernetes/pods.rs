// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Backing pod discovery for services

use crate::error::{Result, TunnelError};
use crate::types::{PodCandidate, ServiceDescriptor};
use k8s_openapi::api::core::v1::Pod;
use kube::{api::ListParams, Api, Client};
use tracing::{debug, info, instrument, warn};

/// Picks one pod out of the candidates matched by a service selector.
///
/// The listing order of the API is not guaranteed, so strategies should not
/// rely on it for anything stronger than a tie-break.
pub trait SelectionStrategy: Send + Sync {
    fn select<'a>(&self, candidates: &'a [PodCandidate]) -> Option<&'a PodCandidate>;
}

/// Prefer a Running pod, otherwise take the first candidate so the caller gets
/// a connection error from a real pod instead of an opaque "no pod" failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct PreferRunning;

impl SelectionStrategy for PreferRunning {
    fn select<'a>(&self, candidates: &'a [PodCandidate]) -> Option<&'a PodCandidate> {
        candidates
            .iter()
            .find(|p| p.is_running())
            .or_else(|| candidates.first())
    }
}

/// Resolves the pod currently backing a service
pub struct PodSelector<S = PreferRunning> {
    client: Client,
    strategy: S,
}

impl PodSelector {
    pub fn new(client: Client) -> Self {
        Self::with_strategy(client, PreferRunning)
    }
}

impl<S: SelectionStrategy> PodSelector<S> {
    pub fn with_strategy(client: Client, strategy: S) -> Self {
        Self { client, strategy }
    }

    /// List the pods matching the service selector and pick one of them.
    /// Issues a single read-only list query.
    #[instrument(skip(self, service), fields(namespace = %service.namespace, service = %service.name))]
    pub async fn select(&self, service: &ServiceDescriptor) -> Result<PodCandidate> {
        let selector = &service.selector;
        if selector.is_empty() {
            return Err(TunnelError::SelectorRejected {
                namespace: service.namespace.clone(),
                service: service.name.clone(),
            });
        }

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &service.namespace);
        let params = ListParams::default().labels(&selector.to_string());
        let listed = pods.list(&params).await?;

        let candidates: Vec<PodCandidate> = listed
            .items
            .iter()
            .map(PodCandidate::from)
            .collect();

        debug!("Selector '{}' matched {} pod(s)", selector, candidates.len());

        let pod = self
            .strategy
            .select(&candidates)
            .ok_or_else(|| TunnelError::PodNotFound {
                namespace: service.namespace.clone(),
                selector: selector.to_string(),
            })?;

        if pod.is_running() {
            info!("Selected pod {}", pod.qualified_name());
        } else {
            warn!(
                "No running pod for selector '{}', falling back to {} ({:?})",
                selector,
                pod.qualified_name(),
                pod.phase
            );
        }

        Ok(pod.clone())
    }
}
