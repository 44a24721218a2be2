// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client creation from an explicit `Config`

use crate::config::Config;
use crate::error::{Result, TunnelError};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KConfig};
use tracing::{debug, instrument};

/// Create a Kubernetes client for the cluster described by `config`.
///
/// An explicit kubeconfig path wins, then an explicit context in the default
/// kubeconfig, and finally kube's own inference (`KUBECONFIG`, in-cluster).
#[instrument(skip(config), fields(kubeconfig = ?config.kubeconfig, context = ?config.context))]
pub async fn create_client(config: &Config) -> Result<Client> {
    let options = KubeConfigOptions {
        context: config.context.clone(),
        ..Default::default()
    };

    let client_config = match &config.kubeconfig {
        Some(path) => {
            debug!("Loading kubeconfig from {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                TunnelError::KubeconfigError(format!(
                    "Failed to read kubeconfig {}: {}",
                    path.display(),
                    e
                ))
            })?;
            KConfig::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| {
                    TunnelError::KubeconfigError(format!("Failed to create config: {}", e))
                })?
        }
        None if config.context.is_some() => KConfig::from_kubeconfig(&options)
            .await
            .map_err(|e| TunnelError::KubeconfigError(format!("Failed to create config: {}", e)))?,
        None => KConfig::infer()
            .await
            .map_err(|e| TunnelError::KubeconfigError(format!("Failed to infer config: {}", e)))?,
    };

    Client::try_from(client_config)
        .map_err(|e| TunnelError::KubeconfigError(format!("Failed to create client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_missing_kubeconfig_file() {
        let config = Config {
            kubeconfig: Some(PathBuf::from("/nonexistent/shoulders/kubeconfig")),
            ..Default::default()
        };

        let Err(err) = create_client(&config).await else {
            panic!("expected a kubeconfig error");
        };

        assert!(matches!(err, TunnelError::KubeconfigError(_)));
        assert!(err.to_string().contains("/nonexistent/shoulders/kubeconfig"));
    }
}
