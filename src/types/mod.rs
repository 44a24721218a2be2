// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster objects reduced to what tunnel establishment needs.

pub mod pod;
pub mod selector;
pub mod service;

pub use pod::{ContainerPorts, NamedPort, PodCandidate, PodPhase};
pub use selector::LabelSelector;
pub use service::{ServiceDescriptor, ServicePortMapping, TargetPort};
