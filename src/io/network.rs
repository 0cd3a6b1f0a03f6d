//! Reading and writing the `Network` document: topology, the self-healing
//! protocol window, and the frame traffic description.

use shp_net::ids::{FrameId, LinkId, NodeId};
use shp_net::schedule::{Frame, Schedule};
use shp_net::time::{SizeUnit, SpeedUnit, TimeUnit};
use shp_net::topology::{Link, LinkKind, Node, NodeKind, Topology};
use shp_net::window::ProtocolWindow;

use shp_solver::xmlutil::{self, Element};

/// A fully-parsed `Network` document.
#[derive(Debug)]
pub struct NetworkDocument {
    /// The network's physical topology.
    pub topology: Topology,
    /// The minimum switch processing delay, in nanoseconds.
    pub minimum_switch_time_ns: i64,
    /// The self-healing protocol's bandwidth reservation window, if this
    /// network has one configured.
    pub protocol: Option<ProtocolWindow>,
    /// The frame traffic description, with paths already installed.
    pub schedule: Schedule,
}

/// Parse a `Network` XML document.
pub fn read_network_xml(xml: &str) -> Result<NetworkDocument, String> {
    let doc = xmlutil::parse(xml).map_err(|e| e.to_string())?;
    let root = doc.root_element();

    let general = xmlutil::child(root, "GeneralInformation")
        .ok_or_else(|| "missing GeneralInformation".to_string())?;
    let switch_info = xmlutil::child(general, "SwitchInformation")
        .ok_or_else(|| "missing SwitchInformation".to_string())?;
    let min_time_node = xmlutil::child(switch_info, "MinimumTime")
        .ok_or_else(|| "missing MinimumTime".to_string())?;
    let minimum_switch_time_ns = read_time_ns(min_time_node)?;

    let protocol = match xmlutil::child(general, "SelfHealingProtocol") {
        Some(shp_node) => {
            let period_node =
                xmlutil::child(shp_node, "Period").ok_or_else(|| "missing Period".to_string())?;
            let time_node =
                xmlutil::child(shp_node, "Time").ok_or_else(|| "missing Time".to_string())?;
            Some(ProtocolWindow {
                period_ns: read_time_ns(period_node)?,
                window_ns: read_time_ns(time_node)?,
            })
        }
        None => None,
    };

    let topo_info = xmlutil::child(root, "TopologyInformation")
        .ok_or_else(|| "missing TopologyInformation".to_string())?;

    let mut topology = Topology::new();
    for node_el in xmlutil::children(topo_info, "Node") {
        let id = NodeId(xmlutil::attr_i64(node_el, "NodeID")? as u32);
        let category = node_el
            .attribute("category")
            .ok_or_else(|| "missing node category".to_string())?;
        let kind = match category {
            "Switch" => NodeKind::Switch,
            "EndSystem" => NodeKind::EndSystem,
            "AccessPoint" => NodeKind::AccessPoint,
            other => return Err(format!("unknown node category: {other}")),
        };
        topology.add_node(Node::new(id, kind));
    }
    for node_el in xmlutil::children(topo_info, "Node") {
        let sender = NodeId(xmlutil::attr_i64(node_el, "NodeID")? as u32);
        for conn in xmlutil::children(node_el, "Connection") {
            let receiver_node = xmlutil::child(conn, "NodeID")
                .ok_or_else(|| "missing Connection NodeID".to_string())?;
            let receiver = NodeId(xmlutil::text_i64(receiver_node)? as u32);
            let link_el =
                xmlutil::child(conn, "Link").ok_or_else(|| "missing Link".to_string())?;
            let link_id = LinkId(
                xmlutil::child(link_el, "LinkID")
                    .ok_or_else(|| "missing LinkID".to_string())
                    .and_then(xmlutil::text_i64)? as u32,
            );
            let speed_node =
                xmlutil::child(link_el, "Speed").ok_or_else(|| "missing Speed".to_string())?;
            let speed_unit: SpeedUnit = speed_node
                .attribute("unit")
                .ok_or_else(|| "missing speed unit".to_string())?
                .parse()
                .map_err(|e: shp_net::time::UnitParseError| e.to_string())?;
            let speed = speed_unit.convert_bytes_per_sec(xmlutil::text_i64(speed_node)?);
            let kind = match link_el.attribute("category") {
                Some("Wireless") => LinkKind::Wireless,
                _ => LinkKind::Wired,
            };
            topology
                .add_link(
                    sender,
                    receiver,
                    Link {
                        id: link_id,
                        kind,
                        speed,
                    },
                )
                .map_err(|e| e.to_string())?;
        }
    }

    let traffic = xmlutil::child(root, "TrafficDescription")
        .ok_or_else(|| "missing TrafficDescription".to_string())?;
    let mut schedule = Schedule::new();
    for frame_el in xmlutil::children(traffic, "Frame") {
        let frame_id = FrameId(xmlutil::attr_i64(frame_el, "FrameID")? as u32);
        let period = xmlutil::child(frame_el, "Period")
            .ok_or_else(|| "missing Period".to_string())
            .and_then(xmlutil::text_i64)?;
        let deadline = xmlutil::child(frame_el, "Deadline")
            .map(xmlutil::text_i64)
            .transpose()?
            .unwrap_or(0);
        let size_node =
            xmlutil::child(frame_el, "Size").ok_or_else(|| "missing Size".to_string())?;
        let size_unit: SizeUnit = size_node
            .attribute("unit")
            .ok_or_else(|| "missing size unit".to_string())?
            .parse()
            .map_err(|e: shp_net::time::UnitParseError| e.to_string())?;
        let size = size_unit.convert_bytes(xmlutil::text_i64(size_node)?);
        let starting_time = xmlutil::child(frame_el, "StartingTime")
            .map(xmlutil::text_i64)
            .transpose()?
            .unwrap_or(0);
        let end_to_end = xmlutil::child(frame_el, "EndToEnd")
            .map(xmlutil::text_i64)
            .transpose()?
            .unwrap_or(0);
        let sender = NodeId(
            xmlutil::child(frame_el, "SenderID")
                .ok_or_else(|| "missing SenderID".to_string())
                .and_then(xmlutil::text_i64)? as u32,
        );

        let paths_el =
            xmlutil::child(frame_el, "Paths").ok_or_else(|| "missing Paths".to_string())?;
        let mut receivers = Vec::new();
        let mut parsed_paths = Vec::new();
        for receiver_el in xmlutil::children(paths_el, "Receiver") {
            let receiver = NodeId(
                xmlutil::child(receiver_el, "ReceiverID")
                    .ok_or_else(|| "missing ReceiverID".to_string())
                    .and_then(xmlutil::text_i64)? as u32,
            );
            let path_node =
                xmlutil::child(receiver_el, "Path").ok_or_else(|| "missing Path".to_string())?;
            let path_text = path_node.text().unwrap_or("");
            let links: Vec<LinkId> = path_text
                .split(';')
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<u32>().map(LinkId).map_err(|_| "bad link id in path".to_string()))
                .collect::<Result<_, _>>()?;
            receivers.push(receiver);
            parsed_paths.push((receiver, links));
        }

        let mut frame = Frame::new(
            frame_id,
            sender,
            receivers,
            period,
            deadline,
            size,
            starting_time,
            end_to_end,
        )
        .map_err(|e| e.to_string())?;

        for (receiver, links) in parsed_paths {
            frame
                .set_path_links(receiver, links)
                .map_err(|e| e.to_string())?;
        }
        schedule.insert(frame);
    }

    Ok(NetworkDocument {
        topology,
        minimum_switch_time_ns,
        protocol,
        schedule,
    })
}

/// Render a `Network` XML document, inverse of [`read_network_xml`] for the
/// fields the round-trip law covers (topology, protocol window, frames and
/// paths).
pub fn write_network_xml(doc: &NetworkDocument) -> String {
    let mut general = Element::new("GeneralInformation").child(
        Element::new("SwitchInformation").child(
            Element::new("MinimumTime")
                .attr("unit", "ns")
                .text(doc.minimum_switch_time_ns),
        ),
    );
    if let Some(protocol) = doc.protocol {
        general = general.child(
            Element::new("SelfHealingProtocol")
                .child(Element::new("Period").attr("unit", "ns").text(protocol.period_ns))
                .child(Element::new("Time").attr("unit", "ns").text(protocol.window_ns)),
        );
    }

    let mut topo = Element::new("TopologyInformation");
    for node in doc.topology.nodes() {
        let category = match node.kind {
            NodeKind::Switch => "Switch",
            NodeKind::EndSystem => "EndSystem",
            NodeKind::AccessPoint => "AccessPoint",
        };
        let connections = doc
            .topology
            .incident_links(node.id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|link_id| {
                let (s, r, link) = doc.topology.link(link_id).ok()?;
                (s == node.id).then(|| {
                    Element::new("Connection")
                        .child(Element::new("NodeID").text(r.0))
                        .child(
                            Element::new("Link")
                                .attr(
                                    "category",
                                    match link.kind {
                                        LinkKind::Wired => "Wired",
                                        LinkKind::Wireless => "Wireless",
                                    },
                                )
                                .child(Element::new("LinkID").text(link_id.0))
                                .child(Element::new("Speed").attr("unit", "KBs").text(link.speed / 1_000)),
                        )
                })
            });
        topo = topo.child(
            Element::new("Node")
                .attr("NodeID", node.id.0)
                .attr("category", category)
                .children(connections),
        );
    }

    let traffic = Element::new("TrafficDescription")
        .attr("method", "specified")
        .children(doc.schedule.frames().map(|frame| {
            let receivers = frame.paths().iter().map(|(receiver, path)| {
                let links: Vec<String> = path.iter().map(|l| l.0.to_string()).collect();
                Element::new("Receiver")
                    .child(Element::new("ReceiverID").text(receiver.0))
                    .child(Element::new("Path").text(links.join(";")))
            });
            Element::new("Frame")
                .attr("FrameID", frame.id().0)
                .child(Element::new("Period").text(frame.period_ns()))
                .child(Element::new("Deadline").text(frame.deadline_ns()))
                .child(Element::new("Size").attr("unit", "Byte").text(frame.size_bytes()))
                .child(Element::new("StartingTime").text(frame.starting_time_ns()))
                .child(Element::new("EndToEnd").text(frame.end_to_end_ns()))
                .child(Element::new("SenderID").text(frame.sender().0))
                .child(Element::new("Paths").children(receivers))
        }));

    Element::new("Network")
        .child(general)
        .child(topo)
        .child(traffic)
        .render()
}

fn read_time_ns(node: roxmltree::Node) -> Result<i64, String> {
    let unit: TimeUnit = node
        .attribute("unit")
        .ok_or_else(|| "missing time unit".to_string())?
        .parse()
        .map_err(|e: shp_net::time::UnitParseError| e.to_string())?;
    Ok(unit.convert_ns(xmlutil::text_i64(node)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_topology_and_frame_path() {
        let mut topology = Topology::new();
        topology.add_node(Node::new(NodeId(0), NodeKind::EndSystem));
        topology.add_node(Node::new(NodeId(1), NodeKind::Switch));
        topology.add_node(Node::new(NodeId(2), NodeKind::EndSystem));
        topology
            .add_link(NodeId(0), NodeId(1), Link { id: LinkId(0), kind: LinkKind::Wired, speed: 1_000_000_000 })
            .unwrap();
        topology
            .add_link(NodeId(1), NodeId(2), Link { id: LinkId(1), kind: LinkKind::Wired, speed: 1_000_000_000 })
            .unwrap();

        let mut frame = Frame::new(FrameId(0), NodeId(0), vec![NodeId(2)], 1000, 0, 64, 0, 0).unwrap();
        frame
            .set_path_links(NodeId(2), vec![LinkId(0), LinkId(1)])
            .unwrap();
        let mut schedule = Schedule::new();
        schedule.insert(frame);

        let doc = NetworkDocument {
            topology,
            minimum_switch_time_ns: 500,
            protocol: Some(ProtocolWindow { period_ns: 100_000, window_ns: 80_000 }),
            schedule,
        };

        let xml = write_network_xml(&doc);
        let parsed = read_network_xml(&xml).unwrap();
        assert_eq!(parsed.minimum_switch_time_ns, 500);
        assert_eq!(parsed.protocol.unwrap().period_ns, 100_000);
        let frame = parsed.schedule.frame(FrameId(0)).unwrap();
        assert_eq!(frame.path(NodeId(2)).unwrap(), &[LinkId(0), LinkId(1)]);
    }
}
