// Self-healing protocol network model
// Copyright (C) 2023 Francisco Pozo
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Discrete-event simulator for the self-healing protocol (SHP/ISHP) on
//! time-triggered deterministic Ethernet networks.
//!
//! Given a scheduled network (a [`shp_net::Topology`] plus a
//! [`shp_net::Schedule`]) and a list of link-failure events, [`sim::Simulator`]
//! reproduces the distributed repair protocol: failure detection, leader
//! notification, path rerouting, patch/optimize solver invocation via
//! [`shp_solver`], schedule splicing, and post-run validation.

pub mod event;
pub mod io;
pub mod metrics;
pub mod queue;
pub mod repair;
pub mod sim;
pub mod validator;

#[cfg(test)]
mod test;

pub use event::{Event, ExecutionName, FrameName, InternalName};
pub use metrics::{Classification, MetricsRow, MetricsSink};
pub use repair::{Algorithm, RepairStrategy};
pub use sim::{FailureOutcome, Simulator};
pub use validator::{ValidationReport, Violation};
