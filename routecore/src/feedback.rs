use educe::Educe;
use thiserror::Error;

use crate::framework::RoutingSystem;

/// Why a control payload could not be decoded. The packet is dropped without touching any state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("payload is empty")]
    Empty,
    #[error("expected 3 fields, got `{0}`")]
    FieldCount(String),
    #[error("`{0}` is not a valid metric")]
    BadMetric(String),
    #[error("`{0}` is not a valid sequence number")]
    BadSeqno(String),
    #[error("`{0}` is not a valid node address")]
    BadAddress(String),
}

/// Although this is an error enum, these should be treated as warnings.
/// None of them stop the router, they are collected in `Router::warnings` for the runtime to inspect.
#[derive(Error, Educe)]
#[educe(Debug(bound()), Clone(bound()))]
pub enum RoutingWarning<T: RoutingSystem> {
    /// The metric over a link should never be zero (this may result in routing loops!)
    /// If this warning is triggered, the metric is set to 1.
    #[error("link {link:?} came up with a zero metric, using 1 instead")]
    MetricIsZero { link: T::Link },
    /// A control packet failed to decode and was dropped
    #[error("dropped malformed control packet from {from} on link {link:?}")]
    MalformedPayload {
        link: T::Link,
        from: T::NodeAddress,
        #[source]
        error: WireError,
    },
    /// Another node flooded an LSA in our name with a newer seqno than ours.
    /// NOTE: This might be an indication of node data loss!
    #[error("own LSA seen with seqno {new_seqno}, ours was {old_seqno}")]
    DesynchronizedSeqno { old_seqno: u64, new_seqno: u64 },
}
