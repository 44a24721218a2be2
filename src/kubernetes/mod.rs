// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes access: client creation, service lookup, pod selection and port-forwarding.

pub mod client;
pub mod pods;
pub mod portforward;
pub mod services;

pub use client::create_client;
pub use pods::{PodSelector, PreferRunning, SelectionStrategy};
pub use portforward::{KubeDialer, KubeForwarderFactory, PodDialer, PodForwarder};
pub use services::fetch_service;
