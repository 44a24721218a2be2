// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Local tunnels to in-cluster services.

pub mod facade;
pub mod handle;
pub mod ports;
pub mod supervisor;

pub use facade::ServiceTunnel;
pub use handle::{StopControl, TunnelHandle};
pub use ports::resolve_target_port;
pub use supervisor::{ForwardTarget, Forwarder, ForwarderFactory, TunnelSupervisor};
