//! Textual wire format of the control payloads.
//!
//! Both protocols send a list of comma separated triples, each followed by ` : `.
//! A distance vector is `destination,cost,next_hop : ...`, an LSA starts with its
//! sequence number: `seqno : endpoint_a,endpoint_b,cost : ...`.
//! Receivers never depend on the order of the triples.

use std::str::FromStr;

use crate::concepts::route::Route;
use crate::dv::{Advert, DistanceVector};
use crate::feedback::WireError;
use crate::framework::RoutingSystem;
use crate::ls::{LinkAdvert, Lsa};

pub const ENTRY_DELIMITER: &str = " : ";
pub const FIELD_DELIMITER: &str = ",";

pub fn encode_vector<'a, T: RoutingSystem + 'a>(
    routes: impl IntoIterator<Item = &'a Route<T>>,
) -> String {
    let mut content = String::new();
    for route in routes {
        content += &format!(
            "{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}{ENTRY_DELIMITER}",
            route.destination, route.cost, route.next_hop
        );
    }
    content
}

pub fn decode_vector<T: RoutingSystem>(content: &str) -> Result<DistanceVector<T>, WireError> {
    let mut vector = DistanceVector::new();
    for entry in entries(content) {
        let [dest, cost, next_hop] = triple(entry)?;
        vector.insert(
            parse_addr::<T>(dest)?,
            Advert {
                cost: parse_metric(cost)?,
                next_hop: parse_addr::<T>(next_hop)?,
            },
        );
    }
    Ok(vector)
}

pub fn encode_lsa<T: RoutingSystem>(lsa: &Lsa<T>) -> String {
    let mut content = format!("{}{ENTRY_DELIMITER}", lsa.seqno);
    for link in &lsa.links {
        content += &format!(
            "{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}{ENTRY_DELIMITER}",
            link.endpoint_a, link.endpoint_b, link.cost
        );
    }
    content
}

pub fn decode_lsa<T: RoutingSystem>(content: &str) -> Result<Lsa<T>, WireError> {
    let mut parts = entries(content);
    let seqno = parts.next().ok_or(WireError::Empty)?;
    let seqno = seqno
        .parse::<u64>()
        .map_err(|_| WireError::BadSeqno(seqno.to_string()))?;
    let mut links = Vec::new();
    for entry in parts {
        let [endpoint_a, endpoint_b, cost] = triple(entry)?;
        links.push(LinkAdvert {
            endpoint_a: parse_addr::<T>(endpoint_a)?,
            endpoint_b: parse_addr::<T>(endpoint_b)?,
            cost: parse_metric(cost)?,
        });
    }
    Ok(Lsa { seqno, links })
}

/// non-empty entries, the trailing delimiter leaves an empty one behind
fn entries(content: &str) -> impl Iterator<Item = &str> {
    content
        .split(ENTRY_DELIMITER)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
}

fn triple(entry: &str) -> Result<[&str; 3], WireError> {
    let fields: Vec<&str> = entry.split(FIELD_DELIMITER).collect();
    <[&str; 3]>::try_from(fields).map_err(|_| WireError::FieldCount(entry.to_string()))
}

fn parse_metric(field: &str) -> Result<u16, WireError> {
    field
        .parse()
        .map_err(|_| WireError::BadMetric(field.to_string()))
}

fn parse_addr<T: RoutingSystem>(field: &str) -> Result<T::NodeAddress, WireError> {
    T::NodeAddress::from_str(field).map_err(|_| WireError::BadAddress(field.to_string()))
}
