//! routecore is an I/O free routing engine implementing distance vector and link state routing.
//!
//! A [`router::Router`] runs one node of the network. The host runtime feeds it link events,
//! received packets and the current time, then drains [`router::NodeState::outbound_packets`]
//! and delivers them. Nothing in this crate blocks, spawns or touches the network.

pub mod codec;
pub mod concepts;
pub mod dv;
pub mod feedback;
pub mod framework;
pub mod ls;
pub mod protocol;
pub mod router;
pub mod util;
