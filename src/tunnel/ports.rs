// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Service port to container port resolution

use crate::error::{Result, TunnelError};
use crate::types::{PodCandidate, ServiceDescriptor, TargetPort};
use tracing::debug;

/// Resolve the container port that an exposed service port forwards to on a
/// specific pod.
///
/// Unknown service ports, unset numbers and empty names all fall back to the
/// exposed port itself. Named targets only make sense relative to the pod they
/// are looked up in, so this must run after pod selection.
pub fn resolve_target_port(
    service: &ServiceDescriptor,
    service_port: u16,
    pod: &PodCandidate,
) -> Result<i32> {
    let fallback = i32::from(service_port);

    let Some(mapping) = service.port_mapping(service_port) else {
        debug!(
            "Service {}/{} does not declare port {}, forwarding to it directly",
            service.namespace, service.name, service_port
        );
        return Ok(fallback);
    };

    match &mapping.target {
        TargetPort::Number(n) if *n > 0 => Ok(*n),
        TargetPort::Number(_) => Ok(fallback),
        TargetPort::Name(name) if name.is_empty() => Ok(fallback),
        TargetPort::Name(name) => {
            let port = pod
                .find_named_port(name)
                .ok_or_else(|| TunnelError::PortUnresolved {
                    namespace: service.namespace.clone(),
                    service: service.name.clone(),
                    port_name: name.clone(),
                    pod: pod.name.clone(),
                    service_port,
                })?;
            debug!("Resolved named port {:?} to {} on pod {}", name, port, pod.name);
            Ok(port)
        }
    }
}
