//! The interface between the simulator core and the external solver
//! process, plus the two implementations: one that actually spawns a
//! subprocess, one that is an in-memory test double.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};

use crate::error::SolverError;
use crate::request::{SolverAction, SolverRequest};
use crate::response::{ExecutionTiming, PatchedSchedule};
use crate::xmlutil::{self, Element};

/// The interface the simulator core depends on: write a request, get back
/// either the computed schedule or a categorized failure, plus how long the
/// solver took (as simulated time, not wall-clock).
pub trait SolverBridge {
    /// Run the solver for `request`, synchronously.
    fn solve(&self, request: &SolverRequest) -> Result<(PatchedSchedule, ExecutionTiming), SolverError>;
}

/// Deletes the file it owns when dropped, regardless of whether the
/// enclosing operation succeeded — the idiomatic-Rust equivalent of the
/// reference implementation's repeated manual `remove(...)` calls on both
/// the success and error paths of every solver invocation.
struct TempFileGuard {
    path: PathBuf,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        TempFileGuard { path }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("failed to remove solver temp file {:?}: {e}", self.path);
            }
        }
    }
}

/// Spawns a configured external solver binary for the patch and optimize
/// passes, communicating over the file triple of request/schedule/execution
/// files in a scoped temporary directory.
pub struct ProcessSolverBridge {
    patch_binary: PathBuf,
    optimize_binary: PathBuf,
    work_dir: PathBuf,
}

impl ProcessSolverBridge {
    /// Create a bridge that invokes the given binaries, staging its
    /// temporary files under `work_dir`.
    pub fn new(
        patch_binary: impl Into<PathBuf>,
        optimize_binary: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        ProcessSolverBridge {
            patch_binary: patch_binary.into(),
            optimize_binary: optimize_binary.into(),
            work_dir: work_dir.into(),
        }
    }

    fn binary_for(&self, action: SolverAction) -> &Path {
        match action {
            SolverAction::Patch => &self.patch_binary,
            SolverAction::Optimize => &self.optimize_binary,
        }
    }
}

impl SolverBridge for ProcessSolverBridge {
    fn solve(&self, request: &SolverRequest) -> Result<(PatchedSchedule, ExecutionTiming), SolverError> {
        std::fs::create_dir_all(&self.work_dir)
            .map_err(|e| SolverError::Io(format!("creating work dir: {e}")))?;

        let request_path = self.work_dir.join(format!(
            "{:?}_{}_request.xml",
            request.action, request.general.link_id
        ));
        let schedule_path = self.work_dir.join(format!(
            "{:?}_{}_schedule.xml",
            request.action, request.general.link_id
        ));
        let execution_path = self.work_dir.join(format!(
            "{:?}_{}_execution.xml",
            request.action, request.general.link_id
        ));

        let _request_guard = TempFileGuard::new(request_path.clone());
        let _schedule_guard = TempFileGuard::new(schedule_path.clone());
        let _execution_guard = TempFileGuard::new(execution_path.clone());

        std::fs::write(&request_path, write_request_xml(request))
            .map_err(|e| SolverError::Io(format!("writing request file: {e}")))?;

        debug!("invoking solver for {:?} on link {}", request.action, request.general.link_id);
        let status = Command::new(self.binary_for(request.action))
            .arg(&request_path)
            .arg(&schedule_path)
            .arg(&execution_path)
            .status()
            .map_err(|e| SolverError::Io(format!("spawning solver: {e}")))?;
        if !status.success() {
            return Err(SolverError::Io(format!("solver exited with status {status}")));
        }

        if !schedule_path.exists() {
            return Err(SolverError::NoSchedule(request.action));
        }

        let schedule_xml = std::fs::read_to_string(&schedule_path)
            .map_err(|e| SolverError::Io(format!("reading schedule file: {e}")))?;
        let execution_xml = std::fs::read_to_string(&execution_path)
            .map_err(|e| SolverError::Io(format!("reading execution file: {e}")))?;

        let schedule = parse_schedule_xml(&schedule_xml, request.general.link_id)
            .map_err(SolverError::Io)?;
        let timing = parse_execution_xml(&execution_xml).map_err(SolverError::Io)?;

        Ok((schedule, timing))
    }
}

/// An in-memory test double, scripted with a fixed outcome per call.
pub struct StubSolverBridge {
    outcome: Result<(PatchedSchedule, ExecutionTiming), SolverErrorKind>,
}

/// A cloneable description of the outcome the stub should return, since
/// [`SolverError`] itself does not implement `Clone`.
#[derive(Debug, Clone)]
pub enum SolverErrorKind {
    /// The stub should report `NoSchedule` for the given action.
    NoSchedule(SolverAction),
    /// The stub should report a fatal I/O error.
    Io(String),
}

impl StubSolverBridge {
    /// Always succeed with the given schedule and timing.
    pub fn success(schedule: PatchedSchedule, timing: ExecutionTiming) -> Self {
        StubSolverBridge {
            outcome: Ok((schedule, timing)),
        }
    }

    /// Always fail with the given categorized error.
    pub fn failing(kind: SolverErrorKind) -> Self {
        StubSolverBridge { outcome: Err(kind) }
    }
}

impl SolverBridge for StubSolverBridge {
    fn solve(&self, _request: &SolverRequest) -> Result<(PatchedSchedule, ExecutionTiming), SolverError> {
        match &self.outcome {
            Ok((schedule, timing)) => Ok((schedule.clone(), *timing)),
            Err(SolverErrorKind::NoSchedule(action)) => Err(SolverError::NoSchedule(*action)),
            Err(SolverErrorKind::Io(msg)) => Err(SolverError::Io(msg.clone())),
        }
    }
}

fn write_request_xml(request: &SolverRequest) -> String {
    let root_name = match request.action {
        SolverAction::Patch => "Patch",
        SolverAction::Optimize => "Optimize",
    };

    let general = Element::new("GeneralInformation")
        .child(Element::new("LinkID").text(request.general.link_id.0))
        .child(Element::new("LinkSpeed").text(request.general.link_speed))
        .child(Element::new("ProtocolPeriod").text(request.general.protocol_period_slots))
        .child(Element::new("ProtocolTime").text(request.general.protocol_time_slots))
        .child(Element::new("HyperPeriod").text(request.general.hyper_period_slots));

    let fixed_traffic = Element::new("FixedTraffic").children(request.fixed_traffic.iter().map(|f| {
        let offsets = f
            .instances
            .iter()
            .enumerate()
            .map(|(i, (tx, end))| {
                Element::new("Offset").child(
                    Element::new("Instance")
                        .child(Element::new("NumInstance").text(i))
                        .child(Element::new("TransmissionTime").text(*tx))
                        .child(Element::new("EndingTime").text(*end)),
                )
            });
        Element::new("Frame")
            .child(Element::new("FrameID").text(f.frame_id.0))
            .child(Element::new("Period").text(f.period_slots))
            .child(Element::new("Deadline").text(f.deadline_slots))
            .child(Element::new("Size").text(f.size_bytes))
            .child(Element::new("StartingTime").text(f.starting_time_slots))
            .child(Element::new("EndToEndDelay").text(f.end_to_end_slots))
            .children(offsets)
    }));

    let traffic = Element::new("Traffic").children(request.traffic.iter().map(|f| {
        let offsets = f
            .instances
            .iter()
            .enumerate()
            .map(|(i, (min_tx, max_tx))| {
                Element::new("Offset")
                    .child(Element::new("TimeSlots").text(f.transmission_length_slots))
                    .child(
                        Element::new("Instance")
                            .child(Element::new("NumInstance").text(i))
                            .child(Element::new("MinTransmission").text(*min_tx))
                            .child(Element::new("MaxTransmission").text(*max_tx)),
                    )
            });
        Element::new("Frame")
            .child(Element::new("FrameID").text(f.frame_id.0))
            .child(Element::new("Period").text(f.period_slots))
            .child(Element::new("Deadline").text(f.deadline_slots))
            .child(Element::new("Size").text(f.size_bytes))
            .child(Element::new("StartingTime").text(f.starting_time_slots))
            .child(Element::new("EndToEndDelay").text(f.end_to_end_slots))
            .children(offsets)
    }));

    Element::new(root_name)
        .child(general)
        .child(fixed_traffic)
        .child(traffic)
        .render()
}

fn parse_schedule_xml(xml: &str, link_id: shp_net::LinkId) -> Result<PatchedSchedule, String> {
    let doc = xmlutil::parse(xml).map_err(|e| e.to_string())?;
    let root = doc.root_element();
    let traffic = xmlutil::child(root, "TrafficInformation")
        .ok_or_else(|| "missing TrafficInformation".to_string())?;
    let mut frames = Vec::new();
    for frame_node in xmlutil::children(traffic, "Frame") {
        let frame_id_node =
            xmlutil::child(frame_node, "FrameID").ok_or_else(|| "missing FrameID".to_string())?;
        let frame_id = shp_net::FrameId(xmlutil::text_i64(frame_id_node)? as u32);
        let mut instances = Vec::new();
        for inst_node in xmlutil::children(frame_node, "Instance") {
            let tx = xmlutil::child(inst_node, "TransmissionTime")
                .ok_or_else(|| "missing TransmissionTime".to_string())
                .and_then(xmlutil::text_i64)?;
            let end = xmlutil::child(inst_node, "EndingTime")
                .ok_or_else(|| "missing EndingTime".to_string())
                .and_then(xmlutil::text_i64)?;
            instances.push((tx, end));
        }
        frames.push((frame_id, instances));
    }
    Ok(PatchedSchedule { link_id, frames })
}

fn parse_execution_xml(xml: &str) -> Result<ExecutionTiming, String> {
    let doc = xmlutil::parse(xml).map_err(|e| e.to_string())?;
    let root = doc.root_element();
    let exec = xmlutil::child(root, "ExecutionTime")
        .ok_or_else(|| "missing ExecutionTime".to_string())?;
    Ok(ExecutionTiming {
        execution_time_ns: xmlutil::text_i64(exec)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shp_net::FrameId;

    #[test]
    fn stub_returns_scripted_success() {
        let bridge = StubSolverBridge::success(
            PatchedSchedule {
                link_id: shp_net::LinkId(1),
                frames: vec![(FrameId(0), vec![(10, 20)])],
            },
            ExecutionTiming { execution_time_ns: 500 },
        );
        let request = SolverRequest {
            action: SolverAction::Patch,
            general: crate::request::GeneralInformation {
                link_id: shp_net::LinkId(1),
                link_speed: 1_000_000_000,
                protocol_period_slots: 100,
                protocol_time_slots: 80,
                hyper_period_slots: 1000,
            },
            fixed_traffic: vec![],
            traffic: vec![],
        };
        let (schedule, timing) = bridge.solve(&request).unwrap();
        assert_eq!(schedule.frames[0].0, FrameId(0));
        assert_eq!(timing.execution_time_ns, 500);
    }

    #[test]
    fn stub_returns_scripted_no_schedule() {
        let bridge = StubSolverBridge::failing(SolverErrorKind::NoSchedule(SolverAction::Optimize));
        let request = SolverRequest {
            action: SolverAction::Optimize,
            general: crate::request::GeneralInformation {
                link_id: shp_net::LinkId(1),
                link_speed: 1_000_000_000,
                protocol_period_slots: 100,
                protocol_time_slots: 80,
                hyper_period_slots: 1000,
            },
            fixed_traffic: vec![],
            traffic: vec![],
        };
        assert!(matches!(
            bridge.solve(&request),
            Err(SolverError::NoSchedule(SolverAction::Optimize))
        ));
    }

    #[test]
    fn request_xml_round_trips_through_solver_parser() {
        let xml = write_request_xml(&SolverRequest {
            action: SolverAction::Patch,
            general: crate::request::GeneralInformation {
                link_id: shp_net::LinkId(3),
                link_speed: 1_000_000_000,
                protocol_period_slots: 100,
                protocol_time_slots: 80,
                hyper_period_slots: 1000,
            },
            fixed_traffic: vec![],
            traffic: vec![],
        });
        assert!(xml.contains("<Patch>"));
        assert!(xml.contains("<LinkID>3</LinkID>"));
    }
}
