use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use routecore::concepts::packet::{OutboundPacket, Packet};
use routecore::concepts::route::Route;
use routecore::framework::{ProtocolParams, RoutingSystem};
use routecore::protocol::Protocol;
use routecore::router::Router;

pub const HEARTBEAT_MS: u64 = 100;

pub struct VirtualSystem;

impl RoutingSystem for VirtualSystem {
    type NodeAddress = String;
    type Link = i32;
    fn config() -> ProtocolParams {
        ProtocolParams::with_heartbeat_millis(HEARTBEAT_MS)
    }
}

pub type VirtualRouter<P> = Router<VirtualSystem, P>;

/// An in-memory network. Every link id is used as the port number on both of its ends.
/// Packets written during a tick are delivered on the next one.
#[derive(Serialize, Deserialize)]
#[serde(bound(serialize = "P: Serialize", deserialize = "P: Deserialize<'de>"))]
pub struct VirtualNetwork<P: Protocol<VirtualSystem>> {
    pub routers: Vec<VirtualRouter<P>>,
    pub edges: BTreeMap<i32, (String, String, u16)>,
    /// receiving node -> (packet, link it arrives on)
    pub packets: BTreeMap<String, Vec<(Packet<VirtualSystem>, i32)>>,
    /// every packet ever sent, with its sender
    pub sent: Vec<(String, OutboundPacket<VirtualSystem>)>,
    pub now: u64,
}

impl<P: Protocol<VirtualSystem>> VirtualNetwork<P> {
    pub fn create(nodes: &[&str], links: &[(i32, &str, &str, u16)]) -> Self {
        let mut network = VirtualNetwork {
            routers: nodes.iter().map(|id| Router::new(id.to_string())).collect(),
            edges: BTreeMap::new(),
            packets: BTreeMap::new(),
            sent: Vec::new(),
            now: 0,
        };
        for (lid, a, b, metric) in links {
            network.add_edge(*lid, a, b, *metric);
        }
        network
    }

    pub fn add_edge(&mut self, edge_id: i32, a: &str, b: &str, metric: u16) {
        self.edges
            .insert(edge_id, (a.to_string(), b.to_string(), metric));
        self.get_node(a)
            .handle_link_up(edge_id, b.to_string(), metric);
        self.get_node(b)
            .handle_link_up(edge_id, a.to_string(), metric);
        self.flush_packets();
    }

    pub fn update_edge(&mut self, edge_id: i32, metric: u16) {
        let (a, b, _) = self.edges[&edge_id].clone();
        self.add_edge(edge_id, &a, &b, metric);
    }

    /// takes the link down on both ends, packets in flight over it are lost
    pub fn remove_edge(&mut self, edge_id: i32) {
        let (a, b, _) = self.edges.remove(&edge_id).expect("unknown edge");
        self.get_node(&a).handle_link_down(&edge_id);
        self.get_node(&b).handle_link_down(&edge_id);
        for packets in self.packets.values_mut() {
            packets.retain(|(_, link)| *link != edge_id);
        }
        self.flush_packets();
    }

    pub fn get_node(&mut self, node: &str) -> &mut VirtualRouter<P> {
        self.routers
            .iter_mut()
            .find(|r| r.address() == node)
            .unwrap_or_else(|| panic!("No node {node} found"))
    }

    pub fn node(&self, node: &str) -> &VirtualRouter<P> {
        self.routers
            .iter()
            .find(|r| r.address() == node)
            .unwrap_or_else(|| panic!("No node {node} found"))
    }

    pub fn get_route(&self, cur: &str, dest: &str) -> Option<Route<VirtualSystem>> {
        self.node(cur).route_to(&dest.to_string()).cloned()
    }

    pub fn get_next_hop(&self, cur: &str, dest: &str) -> String {
        self.get_route(cur, dest)
            .unwrap_or_else(|| panic!("No route found from {cur} to {dest}"))
            .next_hop
    }

    pub fn get_metric_to(&self, cur: &str, dest: &str) -> u16 {
        self.get_route(cur, dest)
            .unwrap_or_else(|| panic!("No route found from {cur} to {dest}"))
            .cost
    }

    pub fn flush_packets(&mut self) {
        for router in &mut self.routers {
            let sender = router.address().clone();
            for packet in router.drain_outbound() {
                self.packets
                    .entry(packet.dest.clone())
                    .or_default()
                    .push((packet.packet.clone(), packet.link));
                self.sent.push((sender.clone(), packet));
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.packets.values().map(Vec::len).sum()
    }

    /// loses every packet currently in flight
    pub fn drop_packets(&mut self) {
        self.packets.clear();
    }

    pub fn tick(&mut self) {
        let packets = std::mem::take(&mut self.packets);
        for (node, packets) in packets {
            if let Some(router) = self.routers.iter_mut().find(|x| *x.address() == node) {
                for (packet, link) in packets {
                    if router.links().get(&link).is_some() {
                        router.handle_packet(&link, &packet);
                    }
                }
            }
        }
        self.flush_packets()
    }

    pub fn tick_n(&mut self, times: i32) {
        for _ in 0..times {
            self.tick();
        }
    }

    /// ticks until nothing is in flight anymore
    pub fn converge(&mut self) {
        for _ in 0..1000 {
            if self.in_flight() == 0 {
                return;
            }
            self.tick();
        }
        panic!("network did not quiesce, {} packets in flight", self.in_flight());
    }

    /// advances the clock by one heartbeat interval
    pub fn heartbeat(&mut self) {
        self.now += HEARTBEAT_MS;
        let now = self.now;
        for router in &mut self.routers {
            router.handle_time(now);
        }
        self.flush_packets();
    }

    /// Walks a traceroute packet hop by hop from `src`, returning every node it visited
    pub fn traceroute(&mut self, src: &str, dst: &str) -> Vec<String> {
        let mut path = vec![src.to_string()];
        let packet = Packet::traceroute(src.to_string(), dst.to_string());
        let mut hop = (src.to_string(), packet, -1);
        for _ in 0..self.routers.len() {
            let (node, packet, link) = hop;
            let router = self.get_node(&node);
            router.handle_data_packet(&link, &packet);
            let forwarded: Vec<_> = router
                .drain_outbound()
                .into_iter()
                .filter(|out| out.packet.is_traceroute())
                .collect();
            match forwarded.as_slice() {
                [] => return path,
                [out] => {
                    path.push(out.dest.clone());
                    hop = (out.dest.clone(), out.packet.clone(), out.link);
                }
                _ => panic!("{node} forwarded a traceroute more than once"),
            }
        }
        panic!("traceroute from {src} to {dst} is looping: {path:?}");
    }

    pub fn freeze(&self) -> String
    where
        P: Serialize,
    {
        serde_json::to_string(&self).unwrap()
    }

    pub fn restore(state: &str) -> Self
    where
        P: for<'de> Deserialize<'de>,
    {
        serde_json::from_str(state).unwrap()
    }
}
