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

//! Command-line entry point: load a network, a schedule, and a simulation
//! script, then run the failure-repair pipeline and print one metrics row
//! per injected failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use shp::io::{network, schedule as sched_io, simulation};
use shp::metrics::{MetricsRow, MetricsSink};
use shp::sim::Simulator;
use shp_net::window::ProtocolWindow;
use shp_solver::bridge::ProcessSolverBridge;

/// Prints each row to stdout as it's recorded, one CSV line per failure.
struct StdoutMetricsSink;

impl MetricsSink for StdoutMetricsSink {
    fn record(&mut self, row: MetricsRow) {
        println!(
            "{},{:?},{},{},{}",
            row.instance, row.classification, row.successful, row.patching_time_ns, row.optimization_time_ns
        );
    }
}

/// Run the self-healing protocol simulator over a network/schedule pair and
/// a scripted list of link failures.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the Network XML document (topology, protocol window, traffic).
    #[arg(long)]
    network: PathBuf,

    /// Path to the Schedule XML document (per-link offsets, time-slot size).
    #[arg(long)]
    schedule: PathBuf,

    /// Path to the Simulation XML document (algorithm, leaders, failures).
    #[arg(long)]
    simulation: PathBuf,

    /// Path to the Patch solver executable.
    #[arg(long)]
    patch_binary: PathBuf,

    /// Path to the Optimize solver executable.
    #[arg(long)]
    optimize_binary: PathBuf,

    /// Scratch directory for the solver bridge's request/response files.
    #[arg(long, default_value = "./shp-work")]
    work_dir: PathBuf,
}

fn main() -> ExitCode {
    pretty_env_logger::init_timed();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let network_xml = std::fs::read_to_string(&args.network).map_err(|e| e.to_string())?;
    let schedule_xml = std::fs::read_to_string(&args.schedule).map_err(|e| e.to_string())?;
    let simulation_xml = std::fs::read_to_string(&args.simulation).map_err(|e| e.to_string())?;

    let net_doc = network::read_network_xml(&network_xml)?;
    let sched_doc = sched_io::read_schedule_xml(&schedule_xml)?;
    let sim_doc = simulation::read_simulation_xml(&simulation_xml)?;

    let mut full_schedule = net_doc.schedule;
    sched_io::apply_to(&sched_doc, &mut full_schedule)?;

    let protocol = net_doc.protocol.unwrap_or(ProtocolWindow { period_ns: 0, window_ns: 0 });

    let solver = Box::new(ProcessSolverBridge::new(
        args.patch_binary.clone(),
        args.optimize_binary.clone(),
        args.work_dir.clone(),
    ));
    let mut simulator = Simulator::new(
        net_doc.topology,
        full_schedule,
        protocol,
        net_doc.minimum_switch_time_ns,
        sched_doc.time_slot_ns,
        sim_doc.time_classification_ns,
        sim_doc.algorithm,
        &sim_doc.high_performance_switches,
        solver,
        Box::new(StdoutMetricsSink),
    );
    for failure in &sim_doc.failures {
        simulator.inject_failure(failure.id, failure.link, failure.time_ns);
    }
    simulator.simulate().map_err(|e| e.to_string())
}
