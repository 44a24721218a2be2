// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{env as keys, portforward, DEFAULT_BIND_ADDRESS};
use anyhow::{Context, Result};
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Cluster access and tunnel settings, passed explicitly to every operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Kubeconfig to use instead of kube's own inference
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of the current one
    pub context: Option<String>,
    /// Address local tunnels listen on
    pub bind_address: IpAddr,
    /// How long a forwarding session may take to become ready
    pub ready_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            kubeconfig: None,
            context: None,
            bind_address: DEFAULT_BIND_ADDRESS,
            ready_timeout: Duration::from_secs(portforward::TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let bind_address = match lookup(keys::BIND_ADDRESS) {
            Some(value) => parse_var(keys::BIND_ADDRESS, &value)?,
            None => defaults.bind_address,
        };
        let ready_timeout = match lookup(keys::PORT_FORWARD_TIMEOUT_SECS) {
            Some(value) => Duration::from_secs(parse_var(keys::PORT_FORWARD_TIMEOUT_SECS, &value)?),
            None => defaults.ready_timeout,
        };

        Ok(Config {
            kubeconfig: lookup(keys::KUBECONFIG)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            context: lookup(keys::KUBE_CONTEXT).filter(|c| !c.is_empty()),
            bind_address,
            ready_timeout,
        })
    }
}

/// A single "open tunnel" invocation as requested by the binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelRequest {
    pub namespace: String,
    pub service: String,
    pub local_port: u16,
    pub service_port: u16,
}

impl TunnelRequest {
    /// Load the tunnel target from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key).with_context(|| format!("{} environment variable not set", key))
        };

        let service_port: u16 = parse_var(keys::SERVICE_PORT, &required(keys::SERVICE_PORT)?)?;
        // The local side mirrors the service port unless told otherwise
        let local_port = match lookup(keys::LOCAL_PORT) {
            Some(value) => parse_var(keys::LOCAL_PORT, &value)?,
            None => service_port,
        };

        Ok(TunnelRequest {
            namespace: lookup(keys::NAMESPACE).unwrap_or_else(|| "default".to_string()),
            service: required(keys::SERVICE)?,
            local_port,
            service_port,
        })
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid value {:?} for {}", value, key))
}
