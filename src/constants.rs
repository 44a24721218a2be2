// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use std::net::{IpAddr, Ipv4Addr};

/// Environment variables read by `Config` and `TunnelRequest`
pub mod env {
    pub const KUBECONFIG: &str = "SHOULDERS_KUBECONFIG";
    pub const KUBE_CONTEXT: &str = "SHOULDERS_KUBE_CONTEXT";
    pub const BIND_ADDRESS: &str = "SHOULDERS_BIND_ADDRESS";
    pub const PORT_FORWARD_TIMEOUT_SECS: &str = "SHOULDERS_PORT_FORWARD_TIMEOUT_SECS";

    pub const NAMESPACE: &str = "SHOULDERS_NAMESPACE";
    pub const SERVICE: &str = "SHOULDERS_SERVICE";
    pub const LOCAL_PORT: &str = "SHOULDERS_LOCAL_PORT";
    pub const SERVICE_PORT: &str = "SHOULDERS_SERVICE_PORT";
}

/// Port-forward establishment
pub mod portforward {
    /// How long to wait for a forwarding session to accept connections
    pub const TIMEOUT_SECS: u64 = 30;
    /// Initial pause after a failed accept on the local listener
    pub const ACCEPT_BACKOFF_MILLIS: u64 = 50;
    /// Maximum pause between accept retries (exponential backoff cap)
    pub const ACCEPT_BACKOFF_MAX_MILLIS: u64 = 1000;
    /// Consecutive accept failures after which the session gives up
    pub const MAX_ACCEPT_FAILURES: u32 = 10;
}

/// Local tunnels listen on loopback unless configured otherwise
pub const DEFAULT_BIND_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Pod phase in which containers are up and can accept traffic
pub const RUNNING_PHASE: &str = "Running";
