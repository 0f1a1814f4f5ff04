use crate::router::INF;

/// Adds two metrics, anything that reaches INF stays unreachable
///
/// ```
/// use routecore::router::INF;
/// assert_eq!(routecore::util::sum_inf(3, 4), 7);
/// assert_eq!(routecore::util::sum_inf(INF - 1, 4), INF);
/// assert_eq!(routecore::util::sum_inf(INF, 0), INF);
/// ```
pub fn sum_inf(cost_a: u16, cost_b: u16) -> u16 {
    cost_a.checked_add(cost_b).unwrap_or(INF)
}
