// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shoulders_tunnel::config::{Config, TunnelRequest};
use shoulders_tunnel::kubernetes::create_client;
use shoulders_tunnel::tunnel::ServiceTunnel;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let request = TunnelRequest::from_env()?;
    info!(
        "Opening tunnel to {}/{} port {} on local port {}",
        request.namespace, request.service, request.service_port, request.local_port
    );

    let client = create_client(&config).await?;

    // Ctrl-C cancels establishment, or tears the tunnel down once it is up
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted, closing tunnel");
                interrupt.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let tunnel = ServiceTunnel::new(client, &config);
    let handle = tunnel
        .open(
            &request.namespace,
            &request.service,
            request.local_port,
            request.service_port,
            &cancel,
        )
        .await
        .with_context(|| {
            format!(
                "Failed to open tunnel to service {}/{}",
                request.namespace, request.service
            )
        })?;

    info!(
        "Forwarding {} -> pod {} port {}",
        handle.local_addr(),
        handle.pod_name(),
        handle.remote_port()
    );

    handle.stopped().await;
    handle.shutdown().await?;

    info!("Tunnel closed");
    Ok(())
}
