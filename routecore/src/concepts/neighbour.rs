use std::collections::BTreeMap;

use educe::Educe;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::framework::RoutingSystem;

/// A directly attached link, as seen from the local end
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Neighbour<T: RoutingSystem> {
    /// the local port the neighbour is reachable over
    pub link: T::Link,
    /// the routing network address of the remote endpoint
    pub addr: T::NodeAddress,
    /// Direct link-cost to this neighbour. Lower is better, never zero.
    pub link_cost: u16,
}

/// Map from local port to the link attached to it
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()))]
#[cfg_attr(
    feature = "serde",
    serde_with::serde_as,
    derive(Serialize, Deserialize),
    serde(bound = "")
)]
pub struct LinkDirectory<T: RoutingSystem> {
    #[cfg_attr(feature = "serde", serde_as(as = "Vec<(_, _)>"))]
    links: BTreeMap<T::Link, Neighbour<T>>,
}

impl<T: RoutingSystem> Default for LinkDirectory<T> {
    fn default() -> Self {
        Self {
            links: BTreeMap::new(),
        }
    }
}

impl<T: RoutingSystem> LinkDirectory<T> {
    /// installs a link, returning the entry it replaced on the same port
    pub fn insert(&mut self, neighbour: Neighbour<T>) -> Option<Neighbour<T>> {
        self.links.insert(neighbour.link.clone(), neighbour)
    }

    pub fn remove(&mut self, link: &T::Link) -> Option<Neighbour<T>> {
        self.links.remove(link)
    }

    pub fn get(&self, link: &T::Link) -> Option<&Neighbour<T>> {
        self.links.get(link)
    }

    /// The link used to reach `addr`. With parallel links, the cheapest one wins, then the lowest port.
    pub fn best_link_to(&self, addr: &T::NodeAddress) -> Option<&Neighbour<T>> {
        self.links
            .values()
            .filter(|neigh| neigh.addr == *addr)
            .min_by(|a, b| {
                a.link_cost
                    .cmp(&b.link_cost)
                    .then_with(|| a.link.cmp(&b.link))
            })
    }

    pub fn link_cost(&self, addr: &T::NodeAddress) -> Option<u16> {
        self.best_link_to(addr).map(|neigh| neigh.link_cost)
    }

    pub fn egress_port(&self, addr: &T::NodeAddress) -> Option<T::Link> {
        self.best_link_to(addr).map(|neigh| neigh.link.clone())
    }

    pub fn is_connected(&self, addr: &T::NodeAddress) -> bool {
        self.links.values().any(|neigh| neigh.addr == *addr)
    }

    pub fn ports(&self) -> impl Iterator<Item = &T::Link> {
        self.links.keys()
    }

    /// every attached link, ordered by port
    pub fn iter(&self) -> impl Iterator<Item = &Neighbour<T>> {
        self.links.values()
    }

    /// one entry per distinct neighbour, using the link [`LinkDirectory::best_link_to`] would pick
    pub fn neighbours(&self) -> Vec<&Neighbour<T>> {
        let mut best: BTreeMap<&T::NodeAddress, &Neighbour<T>> = BTreeMap::new();
        for neigh in self.links.values() {
            best.entry(&neigh.addr)
                .and_modify(|cur| {
                    if neigh.link_cost < cur.link_cost {
                        *cur = neigh;
                    }
                })
                .or_insert(neigh);
        }
        best.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
