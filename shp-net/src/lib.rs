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

//! Topology, schedule, available-transmission-range and window-planning
//! primitives for a time-triggered Ethernet network running the self-healing
//! protocol (SHP).
//!
//! This crate has no notion of simulated time progression, events, or
//! external solver processes: it is the static/data-structure layer that
//! [`shp`](../shp/index.html) and [`shp-solver`](../shp_solver/index.html)
//! build their dynamic behavior on top of, the same split the `bgpsim`
//! crate draws between the network model and its runtime.

pub mod atr;
pub mod error;
pub mod ids;
pub mod schedule;
pub mod time;
pub mod topology;
pub mod window;

pub use error::{ScheduleError, TopologyError};
pub use ids::{FrameId, LinkId, NodeId};
pub use schedule::{Frame, Offset, Schedule};
pub use time::{SizeUnit, TimeUnit};
pub use topology::{Link, LinkKind, Node, NodeKind, Topology};
