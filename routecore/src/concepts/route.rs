use educe::Educe;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::framework::RoutingSystem;

/// Forwarding table entry
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Route<T: RoutingSystem> {
    pub destination: T::NodeAddress,
    /// total cost of the best known path
    pub cost: u16,
    /// the neighbour the best known path starts with
    pub next_hop: T::NodeAddress,
    /// the local port that connects to the next hop, must be a live link
    pub link: T::Link,
}
