//! End-to-end scenario tests over [`crate::sim::Simulator`], each grounded in
//! one failure-resolution path through the repair pipeline: no traffic on
//! the broken link, no replacement path, a successful reroute, a solver
//! rejection, and the window planner's fragmentation behavior.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use shp_net::ids::{FrameId, LinkId, NodeId};
use shp_net::schedule::{Frame, Schedule};
use shp_net::topology::{Link, LinkKind, Node, NodeKind, Topology};
use shp_net::window::{ProtocolWindow, WindowPlanner};

use shp_solver::bridge::{SolverBridge, StubSolverBridge};
use shp_solver::error::SolverError;
use shp_solver::request::{SolverAction, SolverRequest};
use shp_solver::response::{ExecutionTiming, PatchedSchedule};

use crate::metrics::{Classification, InMemoryMetricsSink, MetricsRow, MetricsSink};
use crate::repair::Algorithm;
use crate::sim::Simulator;

const SLOT_NS: i64 = 100;
const NO_PROTOCOL: ProtocolWindow = ProtocolWindow { period_ns: 0, window_ns: 0 };

/// A diamond: end systems 0 and 3 either side of a two-switch core (1, 2)
/// with a direct link between them plus a detour through switch 4. Every
/// link is modeled as a pair of opposing directed edges, since the healing
/// protocol's own notification traffic needs to flow back toward a leader
/// regardless of which direction the failed data frame ran in.
fn diamond_topology() -> Topology {
    let mut t = Topology::new();
    t.add_node(Node::new(NodeId(0), NodeKind::EndSystem));
    t.add_node(Node::new(NodeId(1), NodeKind::Switch));
    t.add_node(Node::new(NodeId(2), NodeKind::Switch));
    t.add_node(Node::new(NodeId(3), NodeKind::EndSystem));
    t.add_node(Node::new(NodeId(4), NodeKind::Switch));

    let mut link = |id: u32, kind: LinkKind| Link { id: LinkId(id), kind, speed: 1_000_000_000 };
    t.add_link(NodeId(0), NodeId(1), link(0, LinkKind::Wired)).unwrap();
    t.add_link(NodeId(1), NodeId(0), link(1, LinkKind::Wired)).unwrap();
    t.add_link(NodeId(1), NodeId(2), link(2, LinkKind::Wired)).unwrap();
    t.add_link(NodeId(2), NodeId(1), link(3, LinkKind::Wired)).unwrap();
    t.add_link(NodeId(2), NodeId(3), link(4, LinkKind::Wired)).unwrap();
    t.add_link(NodeId(3), NodeId(2), link(5, LinkKind::Wired)).unwrap();
    t.add_link(NodeId(1), NodeId(4), link(6, LinkKind::Wired)).unwrap();
    t.add_link(NodeId(4), NodeId(1), link(7, LinkKind::Wired)).unwrap();
    t.add_link(NodeId(4), NodeId(2), link(8, LinkKind::Wired)).unwrap();
    t.add_link(NodeId(2), NodeId(4), link(9, LinkKind::Wired)).unwrap();
    t
}

fn high_performance_switches() -> HashMap<NodeId, Vec<NodeId>> {
    let mut m = HashMap::new();
    m.insert(NodeId(1), vec![NodeId(1), NodeId(2), NodeId(4)]);
    m
}

/// A single frame 0->3 via 0-1-2-3, with an offset already scheduled on
/// every hop.
fn schedule_with_one_frame() -> Schedule {
    let mut s = Schedule::new();
    let mut frame = Frame::new(FrameId(0), NodeId(0), vec![NodeId(3)], 1_000_000, 0, 64, 0, 0).unwrap();
    frame
        .set_path_links(NodeId(3), vec![LinkId(0), LinkId(2), LinkId(4)])
        .unwrap();
    for (link, t, e) in [(LinkId(0), 0, 10_000), (LinkId(2), 20_000, 30_000), (LinkId(4), 50_000, 60_000)] {
        let offset = frame.ensure_offset(link);
        offset.prepare(1, 0).unwrap();
        offset.set_transmission_time(FrameId(0), link, 0, 0, t).unwrap();
        offset.set_ending_time(FrameId(0), link, 0, 0, e).unwrap();
    }
    s.insert(frame);
    s
}

/// Returns patched offsets keyed by link id so a test solver can hand back
/// distinct, non-colliding times for each hop of a multi-link reroute.
struct ScriptedBridge {
    by_link: HashMap<LinkId, (i64, i64)>,
}

impl SolverBridge for ScriptedBridge {
    fn solve(&self, request: &SolverRequest) -> Result<(PatchedSchedule, ExecutionTiming), SolverError> {
        let link_id = request.general.link_id;
        let (tx, end) = *self.by_link.get(&link_id).expect("scripted link");
        Ok((
            PatchedSchedule {
                link_id,
                frames: vec![(FrameId(0), vec![(tx, end)])],
            },
            ExecutionTiming { execution_time_ns: 1_000 },
        ))
    }
}

fn new_simulator(
    topology: Topology,
    schedule: Schedule,
    solver: Box<dyn SolverBridge>,
    sink: Box<dyn MetricsSink>,
) -> Simulator {
    Simulator::new(
        topology,
        schedule,
        NO_PROTOCOL,
        0,
        SLOT_NS,
        5_000,
        Algorithm::Shp,
        &high_performance_switches(),
        solver,
        sink,
    )
}

#[test]
fn no_transmission_when_broken_link_carries_no_traffic() {
    let topology = diamond_topology();
    let schedule = Schedule::new();
    let rows = Rc::new(RefCell::new(Vec::new()));
    struct Capture(Rc<RefCell<Vec<MetricsRow>>>);
    impl MetricsSink for Capture {
        fn record(&mut self, row: MetricsRow) {
            self.0.borrow_mut().push(row);
        }
    }
    let mut sim = new_simulator(
        topology,
        schedule,
        Box::new(StubSolverBridge::failing(shp_solver::bridge::SolverErrorKind::Io("unused".into()))),
        Box::new(Capture(rows.clone())),
    );
    sim.inject_failure(1, LinkId(2), 0);
    sim.simulate().unwrap();
    let rows = rows.borrow();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].successful);
    assert_eq!(rows[0].classification, Classification::Failed);
}

#[test]
fn no_path_when_the_only_route_is_severed() {
    // A plain line: 0-1-2-3, no detour. Failing the middle link leaves no
    // alternate route at all.
    let mut topology = Topology::new();
    topology.add_node(Node::new(NodeId(0), NodeKind::EndSystem));
    topology.add_node(Node::new(NodeId(1), NodeKind::Switch));
    topology.add_node(Node::new(NodeId(2), NodeKind::Switch));
    topology.add_node(Node::new(NodeId(3), NodeKind::EndSystem));
    let mut link = |id: u32| Link { id: LinkId(id), kind: LinkKind::Wired, speed: 1_000_000_000 };
    topology.add_link(NodeId(0), NodeId(1), link(0)).unwrap();
    topology.add_link(NodeId(1), NodeId(2), link(1)).unwrap();
    topology.add_link(NodeId(2), NodeId(3), link(2)).unwrap();

    let mut schedule = Schedule::new();
    let mut frame = Frame::new(FrameId(0), NodeId(0), vec![NodeId(3)], 1_000_000, 0, 64, 0, 0).unwrap();
    frame
        .set_path_links(NodeId(3), vec![LinkId(0), LinkId(1), LinkId(2)])
        .unwrap();
    let offset = frame.ensure_offset(LinkId(1));
    offset.prepare(1, 0).unwrap();
    offset.set_transmission_time(FrameId(0), LinkId(1), 0, 0, 0).unwrap();
    offset.set_ending_time(FrameId(0), LinkId(1), 0, 0, 1_000).unwrap();
    schedule.insert(frame);

    let rows = Rc::new(RefCell::new(Vec::new()));
    struct Capture(Rc<RefCell<Vec<MetricsRow>>>);
    impl MetricsSink for Capture {
        fn record(&mut self, row: MetricsRow) {
            self.0.borrow_mut().push(row);
        }
    }
    let mut sim = Simulator::new(
        topology,
        schedule,
        NO_PROTOCOL,
        0,
        SLOT_NS,
        5_000,
        Algorithm::Shp,
        &HashMap::new(),
        Box::new(StubSolverBridge::failing(shp_solver::bridge::SolverErrorKind::Io("unused".into()))),
        Box::new(Capture(rows.clone())),
    );
    sim.inject_failure(2, LinkId(1), 0);
    sim.simulate().unwrap();
    let rows = rows.borrow();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].successful);
    assert_eq!(rows[0].classification, Classification::Failed);
}

#[test]
fn successful_reroute_splices_the_new_path_and_heals() {
    let topology = diamond_topology();
    let schedule = schedule_with_one_frame();

    let mut by_link = HashMap::new();
    by_link.insert(LinkId(6), (100, 200));
    by_link.insert(LinkId(8), (300, 400));
    let solver = ScriptedBridge { by_link };

    let rows = Rc::new(RefCell::new(Vec::new()));
    struct Capture(Rc<RefCell<Vec<MetricsRow>>>);
    impl MetricsSink for Capture {
        fn record(&mut self, row: MetricsRow) {
            self.0.borrow_mut().push(row);
        }
    }

    let mut sim = new_simulator(topology, schedule, Box::new(solver), Box::new(Capture(rows.clone())));
    sim.inject_failure(3, LinkId(2), 0);
    sim.simulate().unwrap();

    let rows = rows.borrow();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].successful);
    assert_eq!(rows[0].classification, Classification::HealedFast);

    let frame = sim.schedule().frame(FrameId(0)).unwrap();
    assert_eq!(
        frame.path(NodeId(3)).unwrap(),
        &[LinkId(0), LinkId(6), LinkId(8), LinkId(4)]
    );
    let detour_in = frame.offset(LinkId(6)).unwrap();
    assert_eq!(detour_in.transmission_time(0, 0).unwrap(), Some(10_000));
    assert_eq!(detour_in.ending_time(0, 0).unwrap(), Some(20_000));
    let detour_out = frame.offset(LinkId(8)).unwrap();
    assert_eq!(detour_out.transmission_time(0, 0).unwrap(), Some(30_000));
    assert_eq!(detour_out.ending_time(0, 0).unwrap(), Some(40_000));
}

#[test]
fn no_schedule_when_the_solver_rejects_the_patch() {
    let topology = diamond_topology();
    let schedule = schedule_with_one_frame();
    let solver = StubSolverBridge::failing(shp_solver::bridge::SolverErrorKind::NoSchedule(SolverAction::Patch));

    let rows = Rc::new(RefCell::new(Vec::new()));
    struct Capture(Rc<RefCell<Vec<MetricsRow>>>);
    impl MetricsSink for Capture {
        fn record(&mut self, row: MetricsRow) {
            self.0.borrow_mut().push(row);
        }
    }
    let mut sim = new_simulator(topology, schedule, Box::new(solver), Box::new(Capture(rows.clone())));
    sim.inject_failure(4, LinkId(2), 0);
    sim.simulate().unwrap();

    let rows = rows.borrow();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].successful);
}

#[test]
fn solver_io_error_aborts_the_run() {
    let topology = diamond_topology();
    let schedule = schedule_with_one_frame();
    let solver = StubSolverBridge::failing(shp_solver::bridge::SolverErrorKind::Io("solver crashed".into()));
    let mut sim = new_simulator(topology, schedule, Box::new(solver), Box::new(InMemoryMetricsSink::new()));
    sim.inject_failure(5, LinkId(2), 0);
    assert!(sim.simulate().is_err());
}

#[test]
fn placement_inside_the_protocol_window_is_pushed_past_it() {
    let protocol = ProtocolWindow { period_ns: 10_000, window_ns: 2_000 };
    let mut planner = WindowPlanner::new();
    // earliest_ns=8_000 falls inside the [0,2_000) reservation of the next
    // period; the placement must be pushed to (or past) that period's end.
    let end = planner.place(LinkId(0), 1_000_000_000, 900, 8_000, protocol, 0);
    assert!(end >= 10_000);
    assert!(planner.check(protocol).is_ok());
}

#[test]
fn second_frame_on_the_same_link_is_placed_after_the_first() {
    let protocol = NO_PROTOCOL;
    let mut planner = WindowPlanner::new();
    let first_end = planner.place(LinkId(0), 1_000_000_000, 1_000, 0, protocol, 0);
    let second_end = planner.place(LinkId(0), 1_000_000_000, 1_000, 0, protocol, 0);
    assert!(second_end >= first_end);
    assert_eq!(planner.usage(LinkId(0)).len(), 2);
}
