use crate::concepts::neighbour::Neighbour;
use crate::concepts::packet::Packet;
use crate::feedback::WireError;
use crate::framework::RoutingSystem;
use crate::router::NodeState;

/// A routing strategy plugged into [`crate::router::Router`].
///
/// The router owns the link directory and the forwarding table and calls into the protocol
/// after every event. Implementations keep their own state (vectors, LSAs), rebuild
/// `node.routes` and queue whatever they need to disseminate in `node.outbound_packets`.
pub trait Protocol<T: RoutingSystem>: Default {
    /// A link was installed, or its cost changed. The directory already contains it.
    fn link_up(&mut self, node: &mut NodeState<T>, neighbour: &Neighbour<T>);

    /// A link was removed. The directory no longer contains it.
    fn link_down(&mut self, node: &mut NodeState<T>, neighbour: &Neighbour<T>);

    /// Handles a control packet received on `link`.
    ///
    /// Returns whether the information was accepted. Rejected packets must not change any
    /// state nor cause anything to be sent.
    fn handle_control(
        &mut self,
        node: &mut NodeState<T>,
        link: &T::Link,
        packet: &Packet<T>,
    ) -> Result<bool, WireError>;

    /// Periodic re-broadcast of the local state
    fn heartbeat(&mut self, node: &mut NodeState<T>);

    /// Recalculate routes based on current data
    fn update_routes(&self, node: &mut NodeState<T>);
}
