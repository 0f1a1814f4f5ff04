use educe::Educe;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::framework::RoutingSystem;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PacketKind {
    /// data packet, forwarded along the forwarding table
    Traceroute,
    /// control packet carrying a distance vector or an LSA
    Routing,
}

/// The packet envelope handed between the runtime and the router. The content is opaque to the runtime.
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Packet<T: RoutingSystem> {
    pub kind: PacketKind,
    pub src_addr: T::NodeAddress,
    pub dst_addr: T::NodeAddress,
    pub content: String,
}

impl<T: RoutingSystem> Packet<T> {
    pub fn routing(src_addr: T::NodeAddress, dst_addr: T::NodeAddress, content: String) -> Self {
        Self {
            kind: PacketKind::Routing,
            src_addr,
            dst_addr,
            content,
        }
    }

    pub fn traceroute(src_addr: T::NodeAddress, dst_addr: T::NodeAddress) -> Self {
        Self {
            kind: PacketKind::Traceroute,
            src_addr,
            dst_addr,
            content: String::new(),
        }
    }

    pub fn is_traceroute(&self) -> bool {
        self.kind == PacketKind::Traceroute
    }
}

#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct OutboundPacket<T: RoutingSystem> {
    /// send via this port
    pub link: T::Link,
    /// to this neighbour
    pub dest: T::NodeAddress,
    pub packet: Packet<T>,
}
