//! Reading the `Simulation` document: which algorithm to run, the
//! high-performance switch topology, the fast/slow healing threshold, and
//! the list of failure events to inject. This document is simulator input
//! only — the core never produces one.

use std::collections::HashMap;

use shp_net::ids::{LinkId, NodeId};

use shp_solver::xmlutil;

use crate::repair::Algorithm;

/// A single scripted link-failure event.
#[derive(Debug, Clone, Copy)]
pub struct FailureEvent {
    /// The failure's identifier.
    pub id: u32,
    /// Which link fails.
    pub link: LinkId,
    /// When it fails, in nanoseconds.
    pub time_ns: i64,
}

/// A fully-parsed `Simulation` document.
#[derive(Debug)]
pub struct SimulationDocument {
    /// Which algorithm revision to run.
    pub algorithm: Algorithm,
    /// Every high-performance switch, and the nodes it leads.
    pub high_performance_switches: HashMap<NodeId, Vec<NodeId>>,
    /// The threshold, in nanoseconds, separating a "fast" from a "slow"
    /// healed classification.
    pub time_classification_ns: i64,
    /// The scripted failure events, in document order.
    pub failures: Vec<FailureEvent>,
}

/// Parse a `Simulation` XML document.
pub fn read_simulation_xml(xml: &str) -> Result<SimulationDocument, String> {
    let doc = xmlutil::parse(xml).map_err(|e| e.to_string())?;
    let root = doc.root_element();
    let general = xmlutil::child(root, "GeneralInformation")
        .ok_or_else(|| "missing GeneralInformation".to_string())?;
    let algo_node =
        xmlutil::child(general, "Algorithm").ok_or_else(|| "missing Algorithm".to_string())?;
    let algorithm = match algo_node.text() {
        Some("SHP") => Algorithm::Shp,
        Some("ISHP") => Algorithm::Ishp,
        other => return Err(format!("unknown algorithm: {other:?}")),
    };
    let time_classification_ns = xmlutil::child(general, "TimeClassification")
        .ok_or_else(|| "missing TimeClassification".to_string())
        .and_then(xmlutil::text_i64)?;

    let mut high_performance_switches = HashMap::new();
    if let Some(special_nodes) = xmlutil::child(root, "SpecialNodes") {
        for hps_el in xmlutil::children(special_nodes, "HighPerformanceSwitch") {
            let id = NodeId(
                xmlutil::child(hps_el, "NodeID")
                    .ok_or_else(|| "missing NodeID".to_string())
                    .and_then(xmlutil::text_i64)? as u32,
            );
            let members = match xmlutil::child(hps_el, "MemberNodes") {
                Some(members_el) => xmlutil::children(members_el, "NodeID")
                    .map(|n| xmlutil::text_i64(n).map(|v| NodeId(v as u32)))
                    .collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };
            high_performance_switches.insert(id, members);
        }
    }

    let mut failures = Vec::new();
    if let Some(events) = xmlutil::child(root, "Events") {
        for (idx, failure_el) in xmlutil::children(events, "Failure").enumerate() {
            if failure_el.attribute("component") != Some("Link") {
                continue;
            }
            let id = xmlutil::child(failure_el, "ID")
                .ok_or_else(|| "missing failure ID".to_string())
                .and_then(xmlutil::text_i64)? as u32;
            let time_node =
                xmlutil::child(failure_el, "Time").ok_or_else(|| "missing failure Time".to_string())?;
            let unit: shp_net::time::TimeUnit = time_node
                .attribute("unit")
                .ok_or_else(|| "missing failure time unit".to_string())?
                .parse()
                .map_err(|e: shp_net::time::UnitParseError| e.to_string())?;
            let time_ns = unit.convert_ns(xmlutil::text_i64(time_node)?);
            let _ = idx;
            failures.push(FailureEvent {
                id,
                link: LinkId(id),
                time_ns,
            });
        }
    }

    Ok(SimulationDocument {
        algorithm,
        high_performance_switches,
        time_classification_ns,
        failures,
    })
}
