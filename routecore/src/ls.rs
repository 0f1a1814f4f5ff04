//! Link state routing.
//!
//! Every node floods an LSA describing its own links. Each node assembles the accepted LSAs
//! into a directed topology graph and runs Dijkstra rooted at itself. A triple may name the
//! originator in either position, the edge always points away from it.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use educe::Educe;
use log::{debug, trace};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::codec::{decode_lsa, encode_lsa};
use crate::concepts::neighbour::Neighbour;
use crate::concepts::packet::Packet;
use crate::concepts::route::Route;
use crate::feedback::{RoutingWarning, WireError};
use crate::framework::RoutingSystem;
use crate::protocol::Protocol;
use crate::router::{NodeState, INF};
use crate::util::sum_inf;

/// One advertised link, endpoints in the order they were written
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct LinkAdvert<T: RoutingSystem> {
    pub endpoint_a: T::NodeAddress,
    pub endpoint_b: T::NodeAddress,
    pub cost: u16,
}

impl<T: RoutingSystem> LinkAdvert<T> {
    /// The far end of the link as seen from `origin`, if `origin` is one of its endpoints
    pub fn peer_of(&self, origin: &T::NodeAddress) -> Option<&T::NodeAddress> {
        if self.endpoint_a == *origin {
            Some(&self.endpoint_b)
        } else if self.endpoint_b == *origin {
            Some(&self.endpoint_a)
        } else {
            None
        }
    }
}

/// Link-State Advertisement
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Lsa<T: RoutingSystem> {
    pub seqno: u64,
    pub links: Vec<LinkAdvert<T>>,
}

#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()))]
#[cfg_attr(
    feature = "serde",
    serde_with::serde_as,
    derive(Serialize, Deserialize),
    serde(bound = "")
)]
pub struct LinkStateProtocol<T: RoutingSystem> {
    /// sequence number of our own latest LSA
    pub seqno: u64,
    /// Originator, last accepted LSA. Includes our own.
    #[cfg_attr(feature = "serde", serde_as(as = "Vec<(_, _)>"))]
    pub lsas: BTreeMap<T::NodeAddress, Lsa<T>>,
}

impl<T: RoutingSystem> Default for LinkStateProtocol<T> {
    fn default() -> Self {
        Self {
            seqno: 0,
            lsas: BTreeMap::new(),
        }
    }
}

impl<T: RoutingSystem> LinkStateProtocol<T> {
    /// Rebuilds our own LSA under a new seqno, recomputes and floods it to every neighbour
    pub fn originate(&mut self, node: &mut NodeState<T>) {
        self.seqno = self.seqno.saturating_add(1);
        let lsa = Lsa {
            seqno: self.seqno,
            links: node
                .links
                .iter()
                .map(|neigh| LinkAdvert {
                    endpoint_a: node.address.clone(),
                    endpoint_b: neigh.addr.clone(),
                    cost: neigh.link_cost,
                })
                .collect(),
        };
        let content = encode_lsa(&lsa);
        self.lsas.insert(node.address.clone(), lsa);
        self.update_routes(node);
        node.write_broadcast_packet(&content);
    }

    /// sends every foreign LSA we hold to a single neighbour
    fn synchronize(&self, node: &mut NodeState<T>, neighbour: &Neighbour<T>) {
        for (origin, lsa) in &self.lsas {
            if *origin == node.address {
                continue;
            }
            node.write_packet(
                neighbour.link.clone(),
                neighbour.addr.clone(),
                Packet::routing(origin.clone(), neighbour.addr.clone(), encode_lsa(lsa)),
            );
        }
    }

    pub fn topology(&self) -> Topology<T> {
        Topology::from_lsas(&self.lsas)
    }
}

impl<T: RoutingSystem> Protocol<T> for LinkStateProtocol<T> {
    fn link_up(&mut self, node: &mut NodeState<T>, neighbour: &Neighbour<T>) {
        self.originate(node);
        self.synchronize(node, neighbour);
    }

    fn link_down(&mut self, node: &mut NodeState<T>, _neighbour: &Neighbour<T>) {
        self.originate(node);
    }

    fn handle_control(
        &mut self,
        node: &mut NodeState<T>,
        link: &T::Link,
        packet: &Packet<T>,
    ) -> Result<bool, WireError> {
        let lsa = decode_lsa::<T>(&packet.content)?;
        let origin = &packet.src_addr;

        if *origin == node.address {
            if lsa.seqno <= self.seqno {
                return Ok(false);
            }
            // a previous incarnation of us is still being flooded, jump past it
            node.warn(RoutingWarning::DesynchronizedSeqno {
                old_seqno: self.seqno,
                new_seqno: lsa.seqno,
            });
            self.seqno = lsa.seqno;
            self.originate(node);
            return Ok(true);
        }

        if let Some(stored) = self.lsas.get(origin) {
            if lsa.seqno <= stored.seqno {
                trace!(
                    "{}: rejected LSA {} from {}, have {}",
                    node.address,
                    lsa.seqno,
                    origin,
                    stored.seqno
                );
                return Ok(false);
            }
        }

        debug!(
            "{}: accepted LSA {} from {} with {} link(s)",
            node.address,
            lsa.seqno,
            origin,
            lsa.links.len()
        );
        self.lsas.insert(origin.clone(), lsa);
        self.update_routes(node);
        node.write_flood_packet(packet, link);
        Ok(true)
    }

    fn heartbeat(&mut self, node: &mut NodeState<T>) {
        self.originate(node);
    }

    fn update_routes(&self, node: &mut NodeState<T>) {
        let mut table = BTreeMap::new();
        for (dest, (cost, next_hop)) in self.topology().shortest_paths(&node.address) {
            // the first hop always comes from our own LSA, which mirrors the link directory
            let Some(link) = node.links.egress_port(&next_hop) else {
                continue;
            };
            table.insert(
                dest.clone(),
                Route {
                    destination: dest,
                    cost,
                    next_hop,
                    link,
                },
            );
        }
        node.install_routes(table);
    }
}

/// Directed graph assembled from LSAs. Both directions of a link are separate edges and may
/// carry different costs.
pub struct Topology<T: RoutingSystem> {
    adjacency: BTreeMap<T::NodeAddress, Vec<(T::NodeAddress, u16)>>,
}

impl<T: RoutingSystem> Topology<T> {
    /// Builds the graph from `(originator, LSA)` pairs. Triples that do not name their
    /// originator describe somebody else's link and are left out.
    pub fn from_lsas<'a>(
        lsas: impl IntoIterator<Item = (&'a T::NodeAddress, &'a Lsa<T>)>,
    ) -> Self
    where
        T: 'a,
    {
        let mut adjacency: BTreeMap<T::NodeAddress, Vec<(T::NodeAddress, u16)>> = BTreeMap::new();
        for (origin, lsa) in lsas {
            for link in &lsa.links {
                if let Some(peer) = link.peer_of(origin) {
                    adjacency
                        .entry(origin.clone())
                        .or_default()
                        .push((peer.clone(), link.cost));
                }
            }
        }
        for edges in adjacency.values_mut() {
            edges.sort();
        }
        Self { adjacency }
    }

    pub fn edges(&self, addr: &T::NodeAddress) -> &[(T::NodeAddress, u16)] {
        self.adjacency.get(addr).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dijkstra rooted at `root`.
    ///
    /// Returns, for every node reachable from `root` other than itself, the path cost and the
    /// first hop of the path. Equal-cost paths are broken by the order nodes leave the queue,
    /// cheapest first and then by address, so the result only depends on the graph.
    pub fn shortest_paths(
        &self,
        root: &T::NodeAddress,
    ) -> BTreeMap<T::NodeAddress, (u16, T::NodeAddress)> {
        let mut dist: BTreeMap<T::NodeAddress, u16> = BTreeMap::new();
        let mut first_hop: BTreeMap<T::NodeAddress, T::NodeAddress> = BTreeMap::new();
        let mut done: BTreeSet<T::NodeAddress> = BTreeSet::new();
        let mut heap = BinaryHeap::new();

        dist.insert(root.clone(), 0);
        heap.push(Reverse((0u16, root.clone())));

        while let Some(Reverse((cost, addr))) = heap.pop() {
            if !done.insert(addr.clone()) {
                continue;
            }
            for (next, weight) in self.edges(&addr) {
                if done.contains(next) {
                    continue;
                }
                let next_cost = sum_inf(cost, *weight);
                if next_cost == INF || dist.get(next).is_some_and(|cur| *cur <= next_cost) {
                    continue;
                }
                let hop = if addr == *root {
                    next.clone()
                } else {
                    match first_hop.get(&addr) {
                        Some(hop) => hop.clone(),
                        None => continue,
                    }
                };
                dist.insert(next.clone(), next_cost);
                first_hop.insert(next.clone(), hop);
                heap.push(Reverse((next_cost, next.clone())));
            }
        }

        dist.into_iter()
            .filter(|(addr, _)| addr != root)
            .filter_map(|(addr, cost)| {
                let hop = first_hop.remove(&addr)?;
                Some((addr, (cost, hop)))
            })
            .collect()
    }
}
