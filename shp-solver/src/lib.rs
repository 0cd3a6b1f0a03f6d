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

//! The bridge between the simulator core and the external patch/optimize
//! schedule solver.
//!
//! The solver itself is an out-of-process binary (an ILP solver wrapper, not
//! part of this crate); [`bridge::SolverBridge`] is the interface the
//! simulator depends on, [`bridge::ProcessSolverBridge`] the implementation
//! that actually shells out, and [`bridge::StubSolverBridge`] a test double.

pub mod bridge;
pub mod error;
pub mod request;
pub mod response;
pub mod xmlutil;

pub use bridge::{ProcessSolverBridge, SolverBridge, StubSolverBridge};
pub use error::SolverError;
pub use request::{SolverAction, SolverRequest};
pub use response::{ExecutionTiming, PatchedSchedule};
