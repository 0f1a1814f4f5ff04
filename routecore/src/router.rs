use std::collections::BTreeMap;

use cfg_if::cfg_if;
use educe::Educe;
use log::{debug, trace, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::concepts::neighbour::{LinkDirectory, Neighbour};
use crate::concepts::packet::{OutboundPacket, Packet};
use crate::concepts::route::Route;
use crate::dv::DistanceVectorProtocol;
use crate::feedback::RoutingWarning;
use crate::framework::{ProtocolParams, RoutingSystem};
use crate::ls::LinkStateProtocol;
use crate::protocol::Protocol;

pub const INF: u16 = 0xFFFF;

pub type DVRouter<T> = Router<T, DistanceVectorProtocol<T>>;
pub type LSRouter<T> = Router<T, LinkStateProtocol<T>>;

/// Everything a node knows that is not specific to a protocol
#[derive(Educe)]
#[educe(Debug(bound()))]
#[cfg_attr(
    feature = "serde",
    serde_with::serde_as,
    derive(Serialize, Deserialize),
    serde(bound = "")
)]
pub struct NodeState<T: RoutingSystem> {
    pub address: T::NodeAddress,
    pub params: ProtocolParams,
    pub links: LinkDirectory<T>,
    /// Destination, Route
    #[cfg_attr(feature = "serde", serde_as(as = "Vec<(_, _)>"))]
    pub routes: BTreeMap<T::NodeAddress, Route<T>>,
    /// packets waiting to be picked up by the runtime
    pub outbound_packets: Vec<OutboundPacket<T>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub warnings: Vec<RoutingWarning<T>>,
}

impl<T: RoutingSystem> NodeState<T> {
    pub fn new(address: T::NodeAddress, params: ProtocolParams) -> Self {
        Self {
            address,
            params,
            links: LinkDirectory::default(),
            routes: BTreeMap::new(),
            outbound_packets: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn write_packet(&mut self, link: T::Link, dest: T::NodeAddress, packet: Packet<T>) {
        self.outbound_packets.push(OutboundPacket { link, dest, packet });
    }

    /// writes a control packet originated by this node to every attached link
    pub fn write_broadcast_packet(&mut self, content: &str) {
        for neigh in self.links.iter() {
            self.outbound_packets.push(OutboundPacket {
                link: neigh.link.clone(),
                dest: neigh.addr.clone(),
                packet: Packet::routing(self.address.clone(), neigh.addr.clone(), content.to_string()),
            });
        }
    }

    /// writes an unmodified copy of `packet` to every attached link except the one it came from
    pub fn write_flood_packet(&mut self, packet: &Packet<T>, ingress: &T::Link) {
        for neigh in self.links.iter() {
            if neigh.link == *ingress {
                continue;
            }
            self.outbound_packets.push(OutboundPacket {
                link: neigh.link.clone(),
                dest: neigh.addr.clone(),
                packet: packet.clone(),
            });
        }
    }

    pub fn install_routes(&mut self, routes: BTreeMap<T::NodeAddress, Route<T>>) {
        if routes != self.routes {
            debug!(
                "{}: forwarding table updated, {} destination(s)",
                self.address,
                routes.len()
            );
            self.routes = routes;
        }
    }

    pub fn warn(&mut self, warning: RoutingWarning<T>) {
        warn!("{}: {}", self.address, warning);
        self.warnings.push(warning);
    }
}

/// The per-node protocol engine. Processes one event at a time, never performs I/O:
/// anything to transmit is queued in `node.outbound_packets`.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(bound(serialize = "P: Serialize", deserialize = "P: Deserialize<'de>"))
)]
pub struct Router<T: RoutingSystem, P: Protocol<T>> {
    pub node: NodeState<T>,
    pub protocol: P,
    /// time of the last periodic broadcast, in milliseconds
    pub last_broadcast: u64,
}

impl<T: RoutingSystem, P: Protocol<T>> Router<T, P> {
    pub fn new(address: T::NodeAddress) -> Self {
        Self::with_params(address, T::config())
    }

    pub fn with_params(address: T::NodeAddress, params: ProtocolParams) -> Self {
        Self {
            node: NodeState::new(address, params),
            protocol: P::default(),
            last_broadcast: 0,
        }
    }

    pub fn address(&self) -> &T::NodeAddress {
        &self.node.address
    }

    pub fn routes(&self) -> &BTreeMap<T::NodeAddress, Route<T>> {
        &self.node.routes
    }

    pub fn route_to(&self, dest: &T::NodeAddress) -> Option<&Route<T>> {
        self.node.routes.get(dest)
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.node.params
    }

    pub fn links(&self) -> &LinkDirectory<T> {
        &self.node.links
    }

    pub fn drain_outbound(&mut self) -> Vec<OutboundPacket<T>> {
        std::mem::take(&mut self.node.outbound_packets)
    }

    pub fn drain_warnings(&mut self) -> Vec<RoutingWarning<T>> {
        std::mem::take(&mut self.node.warnings)
    }

    /// handle a single packet, dispatching on its kind
    pub fn handle_packet(&mut self, link: &T::Link, packet: &Packet<T>) {
        if packet.is_traceroute() {
            self.handle_data_packet(link, packet);
        } else {
            self.handle_control_packet(link, packet);
        }
    }

    /// Forwards a data packet along the forwarding table. Unreachable destinations are dropped.
    pub fn handle_data_packet(&mut self, link: &T::Link, packet: &Packet<T>) {
        if packet.dst_addr == self.node.address {
            trace!(
                "{}: traceroute from {} arrived on {:?}",
                self.node.address,
                packet.src_addr,
                link
            );
            return;
        }
        if let Some(route) = self.node.routes.get(&packet.dst_addr) {
            let (egress, next_hop) = (route.link.clone(), route.next_hop.clone());
            self.node.write_packet(egress, next_hop, packet.clone());
        } else {
            trace!(
                "{}: no route to {}, dropping traceroute from {}",
                self.node.address,
                packet.dst_addr,
                packet.src_addr
            );
        }
    }

    pub fn handle_control_packet(&mut self, link: &T::Link, packet: &Packet<T>) {
        if let Err(error) = self.protocol.handle_control(&mut self.node, link, packet) {
            self.node.warn(RoutingWarning::MalformedPayload {
                link: link.clone(),
                from: packet.src_addr.clone(),
                error,
            });
        }
    }

    /// Installs or replaces the link on `link`, then recomputes and disseminates
    pub fn handle_link_up(&mut self, link: T::Link, addr: T::NodeAddress, cost: u16) {
        let mut link_cost = cost;
        if link_cost == 0 {
            self.node.warn(RoutingWarning::MetricIsZero { link: link.clone() });
            link_cost = 1;
        }
        let neighbour = Neighbour {
            link,
            addr,
            link_cost,
        };
        match self.node.links.insert(neighbour.clone()) {
            Some(old) => debug!(
                "{}: link {:?} changed from {} ({}) to {} ({})",
                self.node.address, neighbour.link, old.addr, old.link_cost, neighbour.addr, link_cost
            ),
            None => debug!(
                "{}: link {:?} up to {} ({})",
                self.node.address, neighbour.link, neighbour.addr, link_cost
            ),
        }
        self.protocol.link_up(&mut self.node, &neighbour);
    }

    pub fn handle_link_down(&mut self, link: &T::Link) {
        match self.node.links.remove(link) {
            Some(neighbour) => {
                debug!(
                    "{}: link {:?} to {} down",
                    self.node.address, link, neighbour.addr
                );
                self.protocol.link_down(&mut self.node, &neighbour);
            }
            None => trace!("{}: link {:?} is not attached", self.node.address, link),
        }
    }

    /// Re-broadcasts the local state once a full heartbeat interval has passed since the last time
    pub fn handle_time(&mut self, now_ms: u64) {
        let interval = u64::try_from(self.node.params.heartbeat_interval.as_millis()).unwrap_or(u64::MAX);
        if now_ms.saturating_sub(self.last_broadcast) >= interval {
            self.last_broadcast = now_ms;
            self.protocol.heartbeat(&mut self.node);
        }
    }

    /// string shown next to the node in a network visualizer
    pub fn debug_string(&self) -> String {
        render_routes(&self.node.routes)
    }
}

cfg_if! {
    if #[cfg(feature = "serde")] {
        fn render_routes<T: RoutingSystem>(routes: &BTreeMap<T::NodeAddress, Route<T>>) -> String {
            serde_json::to_string(&routes.values().collect::<Vec<_>>()).unwrap_or_default()
        }
    } else {
        fn render_routes<T: RoutingSystem>(routes: &BTreeMap<T::NodeAddress, Route<T>>) -> String {
            routes
                .values()
                .map(|route| format!("{} via {} ({})", route.destination, route.next_hop, route.cost))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}
