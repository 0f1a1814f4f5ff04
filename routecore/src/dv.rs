//! Distance vector routing.
//!
//! Every node advertises its whole forwarding table to its direct neighbours. The table is
//! rebuilt from scratch on every trigger, from the direct links and the last vector each live
//! neighbour sent, so cost increases and withdrawn routes are picked up as well as improvements.
//! Entries a neighbour routes back through us are ignored (split horizon), which keeps a
//! failed link from bouncing between two nodes. Longer loops left behind by a partition count
//! up until they reach `ProtocolParams::max_metric`, where the route is withdrawn.

use std::collections::BTreeMap;

use educe::Educe;
use log::{debug, trace};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::codec::{decode_vector, encode_vector};
use crate::concepts::neighbour::Neighbour;
use crate::concepts::packet::Packet;
use crate::concepts::route::Route;
use crate::feedback::WireError;
use crate::framework::RoutingSystem;
use crate::protocol::Protocol;
use crate::router::NodeState;
use crate::util::sum_inf;

/// A single entry of a received distance vector
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Advert<T: RoutingSystem> {
    /// the total cost the neighbour believes it has to the destination
    pub cost: u16,
    /// the neighbour's own next hop towards the destination
    pub next_hop: T::NodeAddress,
}

/// Destination, Advert
pub type DistanceVector<T> = BTreeMap<<T as RoutingSystem>::NodeAddress, Advert<T>>;

#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()))]
#[cfg_attr(
    feature = "serde",
    serde_with::serde_as,
    derive(Serialize, Deserialize),
    serde(bound = "")
)]
pub struct DistanceVectorProtocol<T: RoutingSystem> {
    /// the last vector received from each neighbour, replaced wholesale on change
    #[cfg_attr(feature = "serde", serde_as(as = "Vec<(_, Vec<(_, _)>)>"))]
    pub vectors: BTreeMap<T::NodeAddress, DistanceVector<T>>,
}

impl<T: RoutingSystem> Default for DistanceVectorProtocol<T> {
    fn default() -> Self {
        Self {
            vectors: BTreeMap::new(),
        }
    }
}

impl<T: RoutingSystem> DistanceVectorProtocol<T> {
    /// pushes the current forwarding table to all neighbours
    pub fn broadcast_routes(&self, node: &mut NodeState<T>) {
        let content = encode_vector(node.routes.values());
        node.write_broadcast_packet(&content);
    }

    /// drops the vectors of nodes we no longer have a link to
    fn forget_disconnected(&mut self, node: &NodeState<T>) {
        self.vectors.retain(|from, _| node.links.is_connected(from));
    }

    fn link_changed(&mut self, node: &mut NodeState<T>) {
        self.forget_disconnected(node);
        self.update_routes(node);
        self.broadcast_routes(node);
    }
}

impl<T: RoutingSystem> Protocol<T> for DistanceVectorProtocol<T> {
    fn link_up(&mut self, node: &mut NodeState<T>, _neighbour: &Neighbour<T>) {
        self.link_changed(node);
    }

    fn link_down(&mut self, node: &mut NodeState<T>, _neighbour: &Neighbour<T>) {
        self.link_changed(node);
    }

    fn handle_control(
        &mut self,
        node: &mut NodeState<T>,
        _link: &T::Link,
        packet: &Packet<T>,
    ) -> Result<bool, WireError> {
        let vector = decode_vector::<T>(&packet.content)?;
        let from = &packet.src_addr;
        if *from == node.address {
            return Ok(false);
        }
        if self.vectors.get(from) == Some(&vector) {
            trace!("{}: vector from {} is unchanged", node.address, from);
            return Ok(false);
        }
        debug!(
            "{}: accepted vector from {} with {} entries",
            node.address,
            from,
            vector.len()
        );
        self.vectors.insert(from.clone(), vector);
        self.update_routes(node);
        self.broadcast_routes(node);
        Ok(true)
    }

    fn heartbeat(&mut self, node: &mut NodeState<T>) {
        self.broadcast_routes(node);
    }

    fn update_routes(&self, node: &mut NodeState<T>) {
        let max_metric = node.params.max_metric;
        let mut table = BTreeMap::new();
        // the direct links act as our own zero-hop vector
        for neigh in node.links.neighbours() {
            if neigh.link_cost >= max_metric {
                continue;
            }
            offer(
                &mut table,
                Route {
                    destination: neigh.addr.clone(),
                    cost: neigh.link_cost,
                    next_hop: neigh.addr.clone(),
                    link: neigh.link.clone(),
                },
            );
        }
        for (from, vector) in &self.vectors {
            let Some(hop) = node.links.best_link_to(from) else {
                continue;
            };
            for (dest, advert) in vector {
                if *dest == node.address || advert.next_hop == node.address {
                    continue;
                }
                let cost = sum_inf(hop.link_cost, advert.cost);
                if cost >= max_metric {
                    continue;
                }
                offer(
                    &mut table,
                    Route {
                        destination: dest.clone(),
                        cost,
                        next_hop: from.clone(),
                        link: hop.link.clone(),
                    },
                );
            }
        }
        node.install_routes(table);
    }
}

/// keeps the cheapest route per destination, the first one offered wins ties
fn offer<T: RoutingSystem>(table: &mut BTreeMap<T::NodeAddress, Route<T>>, route: Route<T>) {
    match table.get(&route.destination) {
        Some(cur) if cur.cost <= route.cost => {}
        _ => {
            table.insert(route.destination.clone(), route);
        }
    }
}
