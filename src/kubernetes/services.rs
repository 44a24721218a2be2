// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Service lookup

use crate::error::{Result, TunnelError};
use crate::types::ServiceDescriptor;
use k8s_openapi::api::core::v1::Service;
use kube::{Api, Client};
use tracing::{debug, instrument};

/// Fetch a service's ports and selector. Always reads fresh from the API.
#[instrument(skip(client))]
pub async fn fetch_service(client: &Client, namespace: &str, name: &str) -> Result<ServiceDescriptor> {
    let services: Api<Service> = Api::namespaced(client.clone(), namespace);

    match services.get(name).await {
        Ok(service) => {
            let mut descriptor = ServiceDescriptor::from(&service);
            if descriptor.namespace.is_empty() {
                descriptor.namespace = namespace.to_string();
            }
            debug!(
                "Service {}/{} has {} port(s), selector '{}'",
                namespace,
                name,
                descriptor.ports.len(),
                descriptor.selector
            );
            Ok(descriptor)
        }
        Err(kube::Error::Api(err)) if err.code == 404 => Err(TunnelError::ServiceNotFound {
            namespace: namespace.to_string(),
            service: name.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}
