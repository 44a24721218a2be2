// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::types::selector::LabelSelector;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;

/// Where traffic for an exposed service port goes inside a backing pod
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetPort {
    /// A concrete container port; zero means "unset"
    Number(i32),
    /// A named container port, resolved per pod
    Name(String),
}

impl From<IntOrString> for TargetPort {
    fn from(value: IntOrString) -> Self {
        match value {
            IntOrString::Int(n) => TargetPort::Number(n),
            IntOrString::String(s) => TargetPort::Name(s),
        }
    }
}

/// One entry of a service's port table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServicePortMapping {
    pub port: i32,
    pub target: TargetPort,
}

/// The parts of a Service needed to open a tunnel to it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub namespace: String,
    pub name: String,
    pub ports: Vec<ServicePortMapping>,
    pub selector: LabelSelector,
}

impl ServiceDescriptor {
    /// Find the mapping for an exposed service port
    pub fn port_mapping(&self, port: u16) -> Option<&ServicePortMapping> {
        self.ports.iter().find(|m| m.port == i32::from(port))
    }
}

impl From<&Service> for ServiceDescriptor {
    fn from(service: &Service) -> Self {
        let spec = service.spec.as_ref();

        let ports = spec
            .and_then(|s| s.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .map(|p| ServicePortMapping {
                        port: p.port,
                        // An absent targetPort behaves like an unset number
                        target: p
                            .target_port
                            .clone()
                            .map(TargetPort::from)
                            .unwrap_or(TargetPort::Number(0)),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let selector = spec
            .and_then(|s| s.selector.clone())
            .map(LabelSelector::new)
            .unwrap_or_default();

        ServiceDescriptor {
            namespace: service.namespace().unwrap_or_default(),
            name: service.name_any(),
            ports,
            selector,
        }
    }
}
