//! Reading and writing the `Schedule` document: the hyperperiod, time-slot
//! size, and per-link per-instance offsets for every frame.
//!
//! This document's offsets are expressed in time-slot units; this module
//! converts to/from the nanosecond-based [`Offset`] representation the rest
//! of the crate uses.

use shp_net::ids::{FrameId, LinkId};
use shp_net::schedule::Schedule;

use shp_solver::xmlutil::{self, Element};

/// A fully-parsed `Schedule` document.
#[derive(Debug)]
pub struct ScheduleDocument {
    /// Number of nodes the schedule was computed for (informational).
    pub number_nodes: i64,
    /// Number of links the schedule was computed for (informational).
    pub number_links: i64,
    /// The time-slot quantum, in nanoseconds.
    pub time_slot_ns: i64,
    /// The hyperperiod, in time slots.
    pub hyper_period_slots: i64,
    /// Per-frame, per-link, per-instance offsets, applied on top of an
    /// existing [`Schedule`] by [`apply_to`].
    pub entries: Vec<ScheduleEntry>,
}

/// One `(frame, link, instance)` offset entry.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleEntry {
    /// Which frame this entry belongs to.
    pub frame_id: FrameId,
    /// Which link this entry is on.
    pub link_id: LinkId,
    /// Which instance within the hyperperiod.
    pub instance: usize,
    /// Transmission time, in nanoseconds.
    pub transmission_time_ns: i64,
    /// Ending time, in nanoseconds.
    pub ending_time_ns: i64,
}

/// Apply every entry of a parsed document onto an existing [`Schedule`],
/// preparing offsets as needed.
pub fn apply_to(doc: &ScheduleDocument, schedule: &mut Schedule) -> Result<(), String> {
    for entry in &doc.entries {
        let frame = schedule
            .frame_mut(entry.frame_id)
            .ok_or_else(|| format!("unknown frame {}", entry.frame_id))?;
        let offset = frame
            .offset_mut(entry.link_id)
            .map_err(|e| e.to_string())?;
        if offset.num_instances() == 0 {
            offset
                .prepare((entry.instance + 1).max(1), 0)
                .map_err(|e| e.to_string())?;
        }
        offset
            .set_transmission_time(entry.frame_id, entry.link_id, entry.instance, 0, entry.transmission_time_ns)
            .map_err(|e| e.to_string())?;
        offset
            .set_ending_time(entry.frame_id, entry.link_id, entry.instance, 0, entry.ending_time_ns)
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Parse a `Schedule` XML document.
pub fn read_schedule_xml(xml: &str) -> Result<ScheduleDocument, String> {
    let doc = xmlutil::parse(xml).map_err(|e| e.to_string())?;
    let root = doc.root_element();
    let general = xmlutil::child(root, "GeneralInformation")
        .ok_or_else(|| "missing GeneralInformation".to_string())?;
    let number_nodes = xmlutil::child(general, "NumberNodes")
        .ok_or_else(|| "missing NumberNodes".to_string())
        .and_then(xmlutil::text_i64)?;
    let number_links = xmlutil::child(general, "NumberLinks")
        .ok_or_else(|| "missing NumberLinks".to_string())
        .and_then(xmlutil::text_i64)?;
    let timeslot_node = xmlutil::child(general, "TimeslotSize")
        .ok_or_else(|| "missing TimeslotSize".to_string())?;
    let unit: shp_net::time::TimeUnit = timeslot_node
        .attribute("unit")
        .ok_or_else(|| "missing timeslot unit".to_string())?
        .parse()
        .map_err(|e: shp_net::time::UnitParseError| e.to_string())?;
    let time_slot_ns = unit.convert_ns(xmlutil::text_i64(timeslot_node)?);
    let hyper_period_slots = xmlutil::child(general, "HyperPeriod")
        .ok_or_else(|| "missing HyperPeriod".to_string())
        .and_then(xmlutil::text_i64)?;

    let traffic = xmlutil::child(root, "TrafficInformation")
        .ok_or_else(|| "missing TrafficInformation".to_string())?;
    let mut entries = Vec::new();
    for frame_el in xmlutil::children(traffic, "Frame") {
        let frame_id = FrameId(xmlutil::attr_i64(frame_el, "FrameID")? as u32);
        for path_el in xmlutil::children(frame_el, "Path") {
            for link_el in xmlutil::children(path_el, "Link") {
                let link_id = LinkId(xmlutil::attr_i64(link_el, "LinkID")? as u32);
                for (instance, inst_el) in xmlutil::children(link_el, "Instance").enumerate() {
                    let tx = xmlutil::child(inst_el, "TransmissionTime")
                        .ok_or_else(|| "missing TransmissionTime".to_string())
                        .and_then(xmlutil::text_i64)?;
                    let end = xmlutil::child(inst_el, "EndingTime")
                        .ok_or_else(|| "missing EndingTime".to_string())
                        .and_then(xmlutil::text_i64)?;
                    entries.push(ScheduleEntry {
                        frame_id,
                        link_id,
                        instance,
                        transmission_time_ns: tx * time_slot_ns,
                        ending_time_ns: end * time_slot_ns,
                    });
                }
            }
        }
    }

    Ok(ScheduleDocument {
        number_nodes,
        number_links,
        time_slot_ns,
        hyper_period_slots,
        entries,
    })
}

/// Render a `Schedule` XML document from a live [`Schedule`], the inverse of
/// [`read_schedule_xml`] composed with [`apply_to`].
pub fn write_schedule_xml(
    schedule: &Schedule,
    number_nodes: i64,
    number_links: i64,
    time_slot_ns: i64,
) -> String {
    let hyper_period_slots = schedule.hyper_period_ns() / time_slot_ns.max(1);
    let general = Element::new("GeneralInformation")
        .child(Element::new("NumberNodes").text(number_nodes))
        .child(Element::new("NumberLinks").text(number_links))
        .child(Element::new("TimeslotSize").attr("unit", "ns").text(time_slot_ns))
        .child(Element::new("HyperPeriod").text(hyper_period_slots));

    let traffic = Element::new("TrafficInformation").children(schedule.frames().map(|frame| {
        let paths = frame.offsets().iter().map(|(link_id, offset)| {
            let instances = (0..offset.num_instances()).filter_map(|i| {
                let tx = offset.transmission_time(i, 0).ok().flatten()?;
                let end = offset.ending_time(i, 0).ok().flatten()?;
                Some(
                    Element::new("Instance")
                        .child(Element::new("TransmissionTime").text(tx / time_slot_ns.max(1)))
                        .child(Element::new("EndingTime").text(end / time_slot_ns.max(1))),
                )
            });
            Element::new("Path").child(
                Element::new("Link").attr("LinkID", link_id.0).children(instances),
            )
        });
        Element::new("Frame").attr("FrameID", frame.id().0).children(paths)
    }));

    Element::new("Schedule").child(general).child(traffic).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shp_net::ids::NodeId;
    use shp_net::schedule::Frame;

    #[test]
    fn round_trips_offsets() {
        let mut frame = Frame::new(FrameId(0), NodeId(0), vec![NodeId(1)], 1000, 0, 64, 0, 0).unwrap();
        frame.set_path_links(NodeId(1), vec![LinkId(0)]).unwrap();
        frame.offset_mut(LinkId(0)).unwrap().prepare(1, 0).unwrap();
        frame
            .offset_mut(LinkId(0))
            .unwrap()
            .set_transmission_time(FrameId(0), LinkId(0), 0, 0, 100)
            .unwrap();
        frame
            .offset_mut(LinkId(0))
            .unwrap()
            .set_ending_time(FrameId(0), LinkId(0), 0, 0, 150)
            .unwrap();
        let mut schedule = Schedule::new();
        schedule.insert(frame);

        let xml = write_schedule_xml(&schedule, 2, 1, 10);
        let doc = read_schedule_xml(&xml).unwrap();
        assert_eq!(doc.entries.len(), 1);
        assert_eq!(doc.entries[0].transmission_time_ns, 100);
        assert_eq!(doc.entries[0].ending_time_ns, 150);
    }
}
