// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::RUNNING_PHASE;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

/// Lifecycle phase reported in a pod's status
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl From<Option<&str>> for PodPhase {
    fn from(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => PodPhase::Pending,
            Some(RUNNING_PHASE) => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }
}

/// A declared container port; unnamed ports can only be targeted by number
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedPort {
    pub name: Option<String>,
    pub number: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerPorts {
    pub container: String,
    pub ports: Vec<NamedPort>,
}

/// A pod that may back a service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodCandidate {
    pub namespace: String,
    pub name: String,
    pub phase: PodPhase,
    /// Containers and their ports, in declaration order
    pub containers: Vec<ContainerPorts>,
}

impl PodCandidate {
    pub fn is_running(&self) -> bool {
        self.phase == PodPhase::Running
    }

    /// Look up a named container port, scanning containers then ports in
    /// declaration order. The first match wins.
    pub fn find_named_port(&self, name: &str) -> Option<i32> {
        self.containers
            .iter()
            .flat_map(|c| c.ports.iter())
            .find(|p| p.name.as_deref() == Some(name))
            .map(|p| p.number)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl From<&Pod> for PodCandidate {
    fn from(pod: &Pod) -> Self {
        let containers = pod
            .spec
            .as_ref()
            .map(|spec| {
                spec.containers
                    .iter()
                    .map(|c| ContainerPorts {
                        container: c.name.clone(),
                        ports: c
                            .ports
                            .iter()
                            .flatten()
                            .map(|p| NamedPort {
                                name: p.name.clone(),
                                number: p.container_port,
                            })
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        PodCandidate {
            namespace: pod.namespace().unwrap_or_default(),
            name: pod.name_any(),
            phase: PodPhase::from(pod.status.as_ref().and_then(|s| s.phase.as_deref())),
            containers,
        }
    }
}
