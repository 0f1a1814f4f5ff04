use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;
use std::time::Duration;

use cfg_if::cfg_if;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

cfg_if! {
    if #[cfg(feature = "serde")] {
        use serde::de::DeserializeOwned;

        pub trait RootData: Clone + Serialize + DeserializeOwned + Sized {}
        impl<T: Clone + Serialize + DeserializeOwned + Sized> RootData for T {}
    } else {
        pub trait RootData: Clone + Sized {}
        impl<T: Clone + Sized> RootData for T {}
    }
}

pub trait RootKey: Eq + PartialEq + Hash {}
impl<T: Eq + PartialEq + Hash> RootKey for T {}

pub trait RoutingSystem {
    /// Address of the node on the routing network, MUST be globally unique.
    ///
    /// Addresses are written to the wire with `Display` and read back with `FromStr`,
    /// so the rendered form must not contain `,` or ` : `.
    type NodeAddress: Ord + RootData + RootKey + Display + FromStr + Debug;
    /// Local interface (port) identifier, only meaningful to the node that owns it
    type Link: Ord + RootData + RootKey + Debug;
    fn config() -> ProtocolParams {
        Default::default()
    }
}

/// Protocol parameters, supplied when a router is constructed
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde_with::serde_as, derive(Serialize, Deserialize), serde(default))]
pub struct ProtocolParams {
    /// minimum time between two periodic broadcasts of the local state
    #[cfg_attr(feature = "serde", serde_as(as = "serde_with::DurationMilliSeconds<u64>"))]
    pub heartbeat_interval: Duration,
    /// Distance vector only: a route costing this much or more is unreachable and withdrawn.
    /// Bounds how long a loop left behind by a partition can keep counting up.
    pub max_metric: u16,
}

impl ProtocolParams {
    pub fn with_heartbeat_millis(millis: u64) -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(millis),
            ..Default::default()
        }
    }

    pub fn with_max_metric(self, max_metric: u16) -> Self {
        Self { max_metric, ..self }
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(1000),
            max_metric: 256,
        }
    }
}
