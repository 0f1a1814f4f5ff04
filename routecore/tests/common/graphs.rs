use std::collections::BTreeMap;

use routecore::protocol::Protocol;

use crate::common::virtual_network::{VirtualNetwork, VirtualSystem};

pub type Edges = &'static [(i32, &'static str, &'static str, u16)];

pub const TRIANGLE: Edges = &[(0, "a", "b", 1), (1, "b", "c", 1), (2, "c", "a", 5)];

pub const LINE: Edges = &[(0, "a", "b", 1), (1, "b", "c", 1)];

pub const SIMPLE_WEIGHTED: Edges = &[
    (0, "1", "2", 2),
    (1, "1", "3", 1),
    (2, "2", "3", 4),
    (3, "2", "4", 5),
    (4, "3", "4", 100),
    (5, "3", "5", 8),
    (6, "4", "5", 1),
];

/// a ring of six with two chords, lots of cycles for floods to run around
pub const MESH: Edges = &[
    (0, "a", "b", 3),
    (1, "b", "c", 1),
    (2, "c", "d", 4),
    (3, "d", "e", 1),
    (4, "e", "f", 2),
    (5, "f", "a", 1),
    (6, "a", "d", 9),
    (7, "b", "e", 2),
];

pub fn nodes_of(edges: Edges) -> Vec<&'static str> {
    let mut nodes: Vec<&str> = edges.iter().flat_map(|(_, a, b, _)| [*a, *b]).collect();
    nodes.sort();
    nodes.dedup();
    nodes
}

pub fn vnet<P: Protocol<VirtualSystem>>(edges: Edges) -> VirtualNetwork<P> {
    VirtualNetwork::create(&nodes_of(edges), edges)
}

/// Floyd-Warshall over the undirected graph, the ground truth converged tables are checked against
pub fn true_costs(edges: &[(i32, &str, &str, u16)]) -> BTreeMap<(String, String), u32> {
    let mut nodes: Vec<&str> = edges.iter().flat_map(|(_, a, b, _)| [*a, *b]).collect();
    nodes.sort();
    nodes.dedup();
    let mut dist = BTreeMap::new();
    for (_, a, b, cost) in edges {
        for (x, y) in [(a, b), (b, a)] {
            let entry = dist
                .entry((x.to_string(), y.to_string()))
                .or_insert(u32::MAX);
            *entry = (*entry).min(*cost as u32);
        }
    }
    for k in &nodes {
        for i in &nodes {
            for j in &nodes {
                if i == j {
                    continue;
                }
                let ik = dist.get(&(i.to_string(), k.to_string())).copied();
                let kj = dist.get(&(k.to_string(), j.to_string())).copied();
                if let (Some(ik), Some(kj)) = (ik, kj) {
                    let entry = dist
                        .entry((i.to_string(), j.to_string()))
                        .or_insert(u32::MAX);
                    *entry = (*entry).min(ik + kj);
                }
            }
        }
    }
    dist.retain(|(i, j), _| i != j);
    dist
}

/// asserts every node has a route of the true shortest cost to every other node
pub fn assert_converged<P: Protocol<VirtualSystem>>(network: &VirtualNetwork<P>, edges: Edges) {
    for ((from, to), cost) in true_costs(edges) {
        let route = network
            .get_route(&from, &to)
            .unwrap_or_else(|| panic!("{from} has no route to {to}"));
        assert_eq!(route.cost as u32, cost, "cost from {from} to {to}");
    }
}

/// every route must leave over a live link that actually leads to its next hop
pub fn assert_no_dangling_routes<P: Protocol<VirtualSystem>>(network: &VirtualNetwork<P>) {
    for router in &network.routers {
        for route in router.routes().values() {
            let link = router.links().get(&route.link).unwrap_or_else(|| {
                panic!("{} routes {} over a dead link", router.address(), route.destination)
            });
            assert_eq!(link.addr, route.next_hop);
        }
    }
}
