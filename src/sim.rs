//! The discrete-event simulator core: failure injection, notification
//! routing, the patch/optimize pipeline, and post-repair validation.
//!
//! Grounded in the reference simulator's `Simulation` class: `simulate()`
//! drains a global event queue exactly as `__select_next_event` plus its
//! calling loop do, dispatching to the three handler families of
//! `__simulate_internal_event` / `__simulate_frame_event` /
//! `__simulate_execution_event`.

use std::collections::HashMap;

use log::{debug, info, warn};

use shp_net::atr::AtrCalculator;
use shp_net::ids::{FrameId, LinkId, NodeId};
use shp_net::schedule::Schedule;
use shp_net::topology::Topology;
use shp_net::window::{ProtocolWindow, WindowPlanner};

use shp_solver::bridge::SolverBridge;
use shp_solver::error::SolverError;
use shp_solver::request::{FixedTrafficFrame, GeneralInformation, NewTrafficFrame, SolverAction, SolverRequest};
use shp_solver::response::PatchedSchedule;

use crate::event::{Event, ExecutionEvent, ExecutionName, FrameEvent, FrameName, InternalEvent, InternalName};
use crate::metrics::{Classification, MetricsRow, MetricsSink};
use crate::queue::GlobalQueue;
use crate::repair::{Algorithm, IshpStrategy, RepairStrategy, ShpStrategy};
use crate::validator;

/// Fatal errors that abort `simulate()` entirely. Everything else (NoPath,
/// NoTransmission, NoSchedule) is attributed to a single failure instance and
/// recorded in the metrics sink instead.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The validator found a hard invariant violation after the run.
    #[error("schedule invariant violation: {0:?}")]
    Invariant(Vec<validator::Violation>),
    /// The solver bridge failed for a reason other than "no schedule found".
    #[error("solver I/O error: {0}")]
    SolverIo(String),
}

/// How a single failure instance was ultimately resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The broken link carried no traffic; nothing needed repairing.
    NoTransmission,
    /// No replacement path could be found.
    NoPath,
    /// The solver rejected the patch or optimize request.
    NoSchedule,
    /// The repair completed and passed validation.
    Success,
}

/// Notification/distribution frame size constants, derived once from the
/// network's cardinalities, mirroring `__prepare_simulation`'s code-size
/// bookkeeping.
#[derive(Debug, Clone, Copy)]
struct CodeSizes {
    frame: i64,
    link: i64,
    frame_id: i64,
    inst: i64,
    trans: i64,
}

impl CodeSizes {
    fn compute(num_frames: usize, num_links: usize, hyper_period_ns: i64) -> Self {
        CodeSizes {
            frame: code_bits(num_frames),
            link: code_bits(num_links),
            frame_id: 4,
            inst: 4,
            trans: code_bits(hyper_period_ns.max(2) as usize),
        }
    }
}

fn code_bits(n: usize) -> i64 {
    ((n.max(2) as f64).log2()).ceil() as i64
}

#[derive(Debug, Clone)]
struct FailureState {
    link: LinkId,
    activator: NodeId,
    leader: NodeId,
    new_path: Vec<NodeId>,
    new_path_links: Vec<LinkId>,
    patching_time: HashMap<LinkId, i64>,
    optimize_time: HashMap<LinkId, i64>,
    time_started: i64,
    time_patched: Option<i64>,
    time_optimized: Option<i64>,
    broken_link_utilization: f64,
    broken_link_offsets: usize,
}

/// The simulator: owns the topology, schedule, per-node event queues, and
/// the external collaborators (solver bridge, metrics sink) the repair
/// pipeline drives.
pub struct Simulator {
    topology: Topology,
    schedule: Schedule,
    protocol: ProtocolWindow,
    minimum_switch_time_ns: i64,
    time_slot_ns: i64,
    time_classification_ns: i64,
    algorithm: Algorithm,
    belong_to_high: HashMap<NodeId, NodeId>,
    path_high: HashMap<(NodeId, NodeId), Vec<NodeId>>,
    solver: Box<dyn SolverBridge>,
    metrics: Box<dyn MetricsSink>,
    window_planner: WindowPlanner,
    queue: GlobalQueue,
    failures: HashMap<u32, FailureState>,
    repair_strategies: HashMap<u32, Box<dyn RepairStrategy>>,
    code_sizes: CodeSizes,
}

impl Simulator {
    /// Build a simulator over a topology/schedule pair, the protocol
    /// reservation, the high-performance switch membership map (switch id ->
    /// nodes it leads, switch included), and the solver/metrics
    /// collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        topology: Topology,
        schedule: Schedule,
        protocol: ProtocolWindow,
        minimum_switch_time_ns: i64,
        time_slot_ns: i64,
        time_classification_ns: i64,
        algorithm: Algorithm,
        high_performance_switches: &HashMap<NodeId, Vec<NodeId>>,
        solver: Box<dyn SolverBridge>,
        metrics: Box<dyn MetricsSink>,
    ) -> Self {
        let mut belong_to_high = HashMap::new();
        for (&leader, members) in high_performance_switches {
            belong_to_high.insert(leader, leader);
            for &member in members {
                belong_to_high.insert(member, leader);
            }
        }
        let node_ids: Vec<NodeId> = topology.nodes().map(|n| n.id).collect();
        let num_frames = schedule.frames().count();
        let num_links = node_ids
            .iter()
            .filter_map(|&n| topology.incident_links(n).ok())
            .flatten()
            .collect::<std::collections::HashSet<_>>()
            .len();
        let hyper_period_ns = schedule.hyper_period_ns();
        Simulator {
            topology,
            schedule,
            protocol,
            minimum_switch_time_ns,
            time_slot_ns,
            time_classification_ns,
            algorithm,
            belong_to_high,
            path_high: HashMap::new(),
            solver,
            metrics,
            window_planner: WindowPlanner::new(),
            queue: GlobalQueue::new(node_ids),
            failures: HashMap::new(),
            repair_strategies: HashMap::new(),
            code_sizes: CodeSizes::compute(num_frames, num_links, hyper_period_ns),
        }
    }

    /// Schedule a link failure at the given simulated time.
    pub fn inject_failure(&mut self, failure_id: u32, link: LinkId, time_ns: i64) {
        if let Ok((_, receiver, _)) = self.topology.link(link) {
            self.queue.push(
                receiver,
                Event::Internal(InternalEvent {
                    failure_id,
                    name: InternalName::LinkFailure,
                    time_ns,
                    link,
                    node: receiver,
                }),
            );
        }
    }

    /// Drain the event queue to completion, running the full repair pipeline
    /// for every injected failure. Returns once no node has a pending event.
    pub fn simulate(&mut self) -> Result<(), SimError> {
        while let Some((node, event)) = self.queue.pop_next() {
            match event {
                Event::Internal(ev) => self.handle_link_failure(ev)?,
                Event::Frame(ev) => self.handle_frame(ev, node)?,
                Event::Execution(ev) => self.handle_execution(ev)?,
            }
        }
        Ok(())
    }

    /// The simulator's current schedule, for inspection after [`Simulator::simulate`] completes.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn link_utilization(&self, link: LinkId) -> f64 {
        let hyper = self.schedule.hyper_period_ns().max(1);
        let used: i64 = self
            .schedule
            .offsets_by_link(link)
            .into_iter()
            .flat_map(|(_, o)| (0..o.num_instances()).map(move |i| (o.transmission_time(i, 0), o.ending_time(i, 0))))
            .filter_map(|(t, e)| match (t, e) {
                (Ok(Some(t)), Ok(Some(e))) => Some(e - t),
                _ => None,
            })
            .sum();
        used as f64 / hyper as f64
    }

    fn recompute_high_switch_paths(&mut self) -> bool {
        let leaders: Vec<NodeId> = self.belong_to_high.values().copied().collect::<std::collections::HashSet<_>>().into_iter().collect();
        let nodes: Vec<NodeId> = self.topology.nodes().map(|n| n.id).collect();
        let mut fresh = HashMap::new();
        for leader in leaders {
            for &node in &nodes {
                if leader == node {
                    fresh.insert((leader, node), vec![leader]);
                    fresh.insert((node, leader), vec![leader]);
                    continue;
                }
                let to_node = match self.topology.shortest_path_no_end_systems(leader, node) {
                    Ok(p) => p,
                    Err(_) => return false,
                };
                let to_leader = match self.topology.shortest_path_no_end_systems(node, leader) {
                    Ok(p) => p,
                    Err(_) => return false,
                };
                fresh.insert((leader, node), to_node);
                fresh.insert((node, leader), to_leader);
            }
        }
        self.path_high = fresh;
        true
    }

    fn record_failed(&mut self, failure_id: u32, outcome: FailureOutcome) {
        let state = self.failures.remove(&failure_id);
        self.repair_strategies.remove(&failure_id);
        let (broken_link_utilization, broken_link_offsets, patching_time_ns, optimize_time_ns) = match &state {
            Some(s) => (
                s.broken_link_utilization,
                s.broken_link_offsets,
                s.patching_time.values().sum(),
                s.optimize_time.values().sum(),
            ),
            None => (0.0, 0, 0, 0),
        };
        warn!("failure {failure_id} resolved as {outcome:?}");
        self.metrics.record(MetricsRow {
            instance: failure_id,
            broken_link_utilization,
            path_utilization: 0.0,
            total_utilization: broken_link_utilization,
            broken_link_offsets,
            path_offsets: 0,
            total_offsets: broken_link_offsets,
            successful: false,
            patching_time_ns,
            optimization_time_ns: optimize_time_ns,
            classification: Classification::Failed,
        });
    }

    fn handle_link_failure(&mut self, ev: InternalEvent) -> Result<(), SimError> {
        let link = ev.link;
        let (sender, receiver, _) = match self.topology.link(link) {
            Ok(v) => (v.0, v.1, ()),
            Err(_) => return Ok(()),
        };
        let leader = *self.belong_to_high.get(&receiver).unwrap_or(&receiver);

        info!("link {link} failed at {}ns, activator {receiver}", ev.time_ns);
        let _ = self.topology.remove_link(link);

        let broken_offsets = self.schedule.num_offsets(link);
        if broken_offsets == 0 {
            self.record_failed(ev.failure_id, FailureOutcome::NoTransmission);
            return Ok(());
        }
        let broken_link_utilization = self.link_utilization(link);

        let new_path = match self.topology.shortest_path_no_end_systems(sender, receiver) {
            Ok(p) => p,
            Err(_) => {
                self.record_failed(ev.failure_id, FailureOutcome::NoPath);
                return Ok(());
            }
        };
        if !self.recompute_high_switch_paths() {
            self.record_failed(ev.failure_id, FailureOutcome::NoPath);
            return Ok(());
        }
        let new_path_links = match self.topology.path_to_links(&new_path) {
            Ok(l) => l,
            Err(_) => {
                self.record_failed(ev.failure_id, FailureOutcome::NoPath);
                return Ok(());
            }
        };

        self.failures.insert(
            ev.failure_id,
            FailureState {
                link,
                activator: receiver,
                leader,
                new_path,
                new_path_links,
                patching_time: HashMap::new(),
                optimize_time: HashMap::new(),
                time_started: ev.time_ns,
                time_patched: None,
                time_optimized: None,
                broken_link_utilization,
                broken_link_offsets: broken_offsets,
            },
        );
        let strategy: Box<dyn RepairStrategy> = match self.algorithm {
            Algorithm::Shp => Box::new(ShpStrategy::default()),
            Algorithm::Ishp => Box::new(IshpStrategy::default()),
        };
        self.repair_strategies.insert(ev.failure_id, strategy);

        let notif_path = self
            .path_high
            .get(&(receiver, leader))
            .cloned()
            .unwrap_or_else(|| vec![receiver]);
        let hops = notif_path.len().saturating_sub(1) as i64;
        let size_bits = self.code_sizes.frame + self.code_sizes.link * hops;
        let notif_name = match self.algorithm {
            Algorithm::Shp => FrameName::Notification,
            Algorithm::Ishp => FrameName::NotificationHs,
        };
        debug!("notifying leader {leader} of failure {} via {} hops", ev.failure_id, hops);
        self.queue.push(
            receiver,
            Event::Frame(FrameEvent {
                failure_id: ev.failure_id,
                name: notif_name,
                time_ns: ev.time_ns,
                size_bits,
                path: notif_path,
            }),
        );
        Ok(())
    }

    fn handle_frame(&mut self, ev: FrameEvent, owner: NodeId) -> Result<(), SimError> {
        if ev.path.len() <= 1 {
            return self.handle_frame_arrival(ev, owner);
        }
        let next = ev.path[1];
        let (link_id, link) = match self.topology.link_between(owner, next) {
            Ok(v) => v,
            Err(_) => return Ok(()),
        };
        let size_bytes = (ev.size_bits + 7) / 8;
        let arrival = self
            .window_planner
            .place(link_id, link.speed, size_bytes, ev.time_ns, self.protocol, 0);
        let mut next_path = ev.path;
        next_path.remove(0);
        self.queue.push(
            next,
            Event::Frame(FrameEvent {
                failure_id: ev.failure_id,
                name: ev.name,
                time_ns: arrival,
                size_bits: ev.size_bits,
                path: next_path,
            }),
        );
        Ok(())
    }

    fn handle_frame_arrival(&mut self, ev: FrameEvent, owner: NodeId) -> Result<(), SimError> {
        match ev.name {
            FrameName::NotificationHs | FrameName::Notification => {
                self.queue.push(
                    owner,
                    Event::Execution(ExecutionEvent {
                        failure_id: ev.failure_id,
                        name: ExecutionName::Patch,
                        time_ns: ev.time_ns,
                        node: owner,
                    }),
                );
            }
            FrameName::DistributeSchedulePatch => {
                if let Some(state) = self.failures.get_mut(&ev.failure_id) {
                    let boundary = protocol_boundary(ev.time_ns, self.protocol);
                    let elapsed = boundary - state.time_started;
                    state.time_patched = Some(state.time_patched.map_or(elapsed, |p| p.max(elapsed)));
                    let at_last_node = state.new_path.last() == Some(&owner);
                    if at_last_node {
                        if let Some(strategy) = self.repair_strategies.get_mut(&ev.failure_id) {
                            strategy.mark_distributed();
                        }
                    }
                }
            }
            FrameName::DistributeScheduleOptimize => {
                if let Some(state) = self.failures.get_mut(&ev.failure_id) {
                    let boundary = protocol_boundary(ev.time_ns, self.protocol);
                    let elapsed = boundary - state.time_started;
                    state.time_optimized = Some(state.time_optimized.map_or(elapsed, |p| p.max(elapsed)));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_execution(&mut self, ev: ExecutionEvent) -> Result<(), SimError> {
        match ev.name {
            ExecutionName::Patch => self.handle_patch(ev),
            ExecutionName::Optimize => self.handle_optimize(ev),
        }
    }

    fn build_request(
        &self,
        action: SolverAction,
        link: LinkId,
        broken_link: LinkId,
        new_path_links: &[LinkId],
    ) -> Result<(SolverRequest, i64), SimError> {
        let (_, _, link_weight) = self
            .topology
            .link(link)
            .map_err(|e| SimError::SolverIo(e.to_string()))?;
        let slot = self.time_slot_ns.max(1);
        let atr = AtrCalculator::new(&self.topology, self.minimum_switch_time_ns, slot);

        let traffic_ids: std::collections::HashSet<FrameId> = self
            .schedule
            .offsets_by_link(broken_link)
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        let mut traffic = Vec::new();
        let mut size_bits = 0i64;
        for (frame_id, offset) in self.schedule.offsets_by_link(broken_link) {
            let frame = self.schedule.frame(frame_id).expect("frame exists");
            let ranges = atr.atr(frame, offset, new_path_links, link, broken_link).unwrap_or_default();
            if ranges.is_empty() {
                continue;
            }
            size_bits += self.code_sizes.frame_id + (self.code_sizes.inst + self.code_sizes.trans) * ranges.len() as i64;
            let tx_ns = frame.size_bytes() * 1000 / link_weight.speed.max(1);
            traffic.push(NewTrafficFrame {
                frame_id,
                period_slots: frame.period_ns() / slot,
                deadline_slots: frame.deadline_ns() / slot,
                size_bytes: frame.size_bytes(),
                starting_time_slots: frame.starting_time_ns() / slot,
                end_to_end_slots: frame.end_to_end_ns() / slot,
                transmission_length_slots: tx_ns / slot,
                instances: ranges.into_iter().map(|r| (r.lower, r.upper)).collect(),
            });
        }

        let mut fixed_traffic = Vec::new();
        for (frame_id, offset) in self.schedule.offsets_by_link(link) {
            if traffic_ids.contains(&frame_id) {
                continue;
            }
            let frame = self.schedule.frame(frame_id).expect("frame exists");
            let instances: Vec<(i64, i64)> = (0..offset.num_instances())
                .filter_map(|i| {
                    let t = offset.transmission_time(i, 0).ok().flatten()?;
                    let e = offset.ending_time(i, 0).ok().flatten()?;
                    Some((t / slot, e / slot))
                })
                .collect();
            fixed_traffic.push(FixedTrafficFrame {
                frame_id,
                period_slots: frame.period_ns() / slot,
                deadline_slots: frame.deadline_ns() / slot,
                size_bytes: frame.size_bytes(),
                starting_time_slots: frame.starting_time_ns() / slot,
                end_to_end_slots: frame.end_to_end_ns() / slot,
                instances,
            });
        }

        let request = SolverRequest {
            action,
            general: GeneralInformation {
                link_id: link,
                link_speed: link_weight.speed,
                protocol_period_slots: self.protocol.period_ns / slot,
                protocol_time_slots: self.protocol.window_ns / slot,
                hyper_period_slots: self.schedule.hyper_period_ns() / slot,
            },
            fixed_traffic,
            traffic,
        };
        Ok((request, size_bits))
    }

    fn apply_patched(&mut self, patched: &PatchedSchedule, link: LinkId) -> Result<(), SimError> {
        let slot = self.time_slot_ns.max(1);
        for (frame_id, instances) in &patched.frames {
            let frame = self
                .schedule
                .frame_mut(*frame_id)
                .ok_or_else(|| SimError::SolverIo(format!("unknown frame {frame_id}")))?;
            let offset = frame.ensure_offset(link);
            if offset.num_instances() == 0 {
                offset
                    .prepare(instances.len().max(1), 0)
                    .map_err(|e| SimError::SolverIo(e.to_string()))?;
            }
            for (i, (tx, end)) in instances.iter().enumerate() {
                offset
                    .set_transmission_time(*frame_id, link, i, 0, tx * slot)
                    .map_err(|e| SimError::SolverIo(e.to_string()))?;
                offset
                    .set_ending_time(*frame_id, link, i, 0, end * slot)
                    .map_err(|e| SimError::SolverIo(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn handle_patch(&mut self, ev: ExecutionEvent) -> Result<(), SimError> {
        let state = match self.failures.get(&ev.failure_id) {
            Some(s) => s.clone(),
            None => return Ok(()),
        };

        let mut size_schedule = Vec::with_capacity(state.new_path_links.len());
        for &link in &state.new_path_links {
            let (request, size_bits) = self.build_request(SolverAction::Patch, link, state.link, &state.new_path_links)?;
            size_schedule.push(size_bits);
            match self.solver.solve(&request) {
                Ok((patched, timing)) => {
                    self.apply_patched(&patched, link)?;
                    if let Some(s) = self.failures.get_mut(&ev.failure_id) {
                        s.patching_time.insert(link, timing.execution_time_ns);
                    }
                    if let Some(strategy) = self.repair_strategies.get_mut(&ev.failure_id) {
                        strategy.record_patch(link);
                    }
                }
                Err(SolverError::NoSchedule(_)) => {
                    self.record_failed(ev.failure_id, FailureOutcome::NoSchedule);
                    return Ok(());
                }
                Err(SolverError::Io(msg)) => return Err(SimError::SolverIo(msg)),
            }
        }

        let state = self.failures.get(&ev.failure_id).unwrap().clone();
        if let Some(strategy) = self.repair_strategies.get(&ev.failure_id) {
            debug!(
                "failure {} patch phase complete: {}",
                ev.failure_id,
                strategy.is_patch_complete(&state.new_path_links)
            );
        }
        let time_patch = ev.time_ns + state.patching_time.values().copied().max().unwrap_or(0);
        for (node_it, &node) in state.new_path[1..].iter().enumerate() {
            let path = self
                .path_high
                .get(&(state.leader, node))
                .cloned()
                .unwrap_or_else(|| vec![state.leader, node]);
            let size_bits = self.code_sizes.frame_id + size_schedule.get(node_it).copied().unwrap_or(0);
            self.queue.push(
                state.leader,
                Event::Frame(FrameEvent {
                    failure_id: ev.failure_id,
                    name: FrameName::DistributeSchedulePatch,
                    time_ns: time_patch,
                    size_bits,
                    path,
                }),
            );
        }
        self.queue.push(
            state.leader,
            Event::Execution(ExecutionEvent {
                failure_id: ev.failure_id,
                name: ExecutionName::Optimize,
                time_ns: time_patch,
                node: state.leader,
            }),
        );
        Ok(())
    }

    fn handle_optimize(&mut self, ev: ExecutionEvent) -> Result<(), SimError> {
        let state = match self.failures.get(&ev.failure_id) {
            Some(s) => s.clone(),
            None => return Ok(()),
        };

        let mut size_schedule = Vec::with_capacity(state.new_path_links.len());
        for &link in &state.new_path_links {
            let (request, size_bits) =
                self.build_request(SolverAction::Optimize, link, state.link, &state.new_path_links)?;
            size_schedule.push(size_bits);
            match self.solver.solve(&request) {
                Ok((patched, timing)) => {
                    self.apply_patched(&patched, link)?;
                    if let Some(s) = self.failures.get_mut(&ev.failure_id) {
                        s.optimize_time.insert(link, timing.execution_time_ns);
                    }
                    if let Some(strategy) = self.repair_strategies.get_mut(&ev.failure_id) {
                        strategy.record_patch(link);
                    }
                }
                Err(SolverError::NoSchedule(_)) => {
                    self.record_failed(ev.failure_id, FailureOutcome::NoSchedule);
                    return Ok(());
                }
                Err(SolverError::Io(msg)) => return Err(SimError::SolverIo(msg)),
            }
        }

        let state = self.failures.get(&ev.failure_id).unwrap().clone();
        let time_optimize = ev.time_ns + state.optimize_time.values().copied().max().unwrap_or(0);
        for (node_it, &node) in state.new_path[1..].iter().enumerate() {
            let path = self
                .path_high
                .get(&(state.leader, node))
                .cloned()
                .unwrap_or_else(|| vec![state.leader, node]);
            let size_bits = self.code_sizes.frame_id + size_schedule.get(node_it).copied().unwrap_or(0);
            self.queue.push(
                state.leader,
                Event::Frame(FrameEvent {
                    failure_id: ev.failure_id,
                    name: FrameName::DistributeScheduleOptimize,
                    time_ns: time_optimize,
                    size_bits,
                    path,
                }),
            );
        }

        self.splice_new_path(&state);

        let frame_ids: Vec<FrameId> = self.schedule.frames().map(|f| f.id()).collect();
        for id in frame_ids {
            if let Some(frame) = self.schedule.frame_mut(id) {
                frame.remove_unused_offsets();
            }
        }

        let report = validator::validate(&self.schedule, self.minimum_switch_time_ns, self.protocol);
        if !report.is_ok() {
            return Err(SimError::Invariant(report.violations));
        }
        for w in &report.warnings {
            warn!("{w}");
        }

        debug!("failure {} activator was {}", ev.failure_id, state.activator);
        let path_utilization: f64 = state
            .new_path_links
            .iter()
            .map(|&l| self.link_utilization(l))
            .sum();
        let path_offsets: usize = state.new_path_links.iter().map(|&l| self.schedule.num_offsets(l)).sum();
        let optimize_time_ns = state.optimize_time.values().copied().sum();
        let patching_time_ns = state.patching_time.values().copied().sum();
        info!("failure {} healed (optimize time {optimize_time_ns}ns)", ev.failure_id);
        self.metrics.record(MetricsRow {
            instance: ev.failure_id,
            broken_link_utilization: state.broken_link_utilization,
            path_utilization,
            total_utilization: state.broken_link_utilization + path_utilization,
            broken_link_offsets: state.broken_link_offsets,
            path_offsets,
            total_offsets: state.broken_link_offsets + path_offsets,
            successful: true,
            patching_time_ns,
            optimization_time_ns: optimize_time_ns,
            classification: Classification::classify(true, optimize_time_ns, self.time_classification_ns),
        });
        self.failures.remove(&ev.failure_id);
        self.repair_strategies.remove(&ev.failure_id);
        Ok(())
    }

    fn splice_new_path(&mut self, state: &FailureState) {
        let frame_ids: Vec<FrameId> = self.schedule.frames().map(|f| f.id()).collect();
        let topology = &self.topology;
        for id in frame_ids {
            let broken = state.link;
            if let Some(frame) = self.schedule.frame_mut(id) {
                if frame.link_in_path(broken) {
                    frame.exchange_link(broken, &state.new_path_links);
                    let receivers: Vec<NodeId> = frame.receivers().to_vec();
                    for r in receivers {
                        frame.eliminate_loops(r, |l| topology.link(l).ok().map(|(s, r, _)| (s, r)));
                    }
                }
            }
        }
    }
}

fn protocol_boundary(time_ns: i64, protocol: ProtocolWindow) -> i64 {
    if protocol.period_ns <= 0 {
        return time_ns;
    }
    time_ns - (time_ns % protocol.period_ns) + protocol.period_ns
}
