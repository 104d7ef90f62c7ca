//! Endpoint selection
//!
//! Filters a fetched directory down to the endpoints worth rendering and
//! orders them. Selection is a pure function of its inputs: endpoints are
//! borrowed, never modified, and the same inputs always yield the same
//! sequence.
//!
//! ## Pipeline
//!
//! 1. Keep endpoints with an online entry for the tunnel protocol
//! 2. Keep endpoints in one of the requested groups (if any)
//! 3. Keep endpoints located in one of the requested countries (if any)
//! 4. Fail with [`Error::NoMatch`] if nothing is left
//! 5. Stable sort by ascending load (if least-loaded ordering is requested)
//! 6. Truncate to the requested count ([`select`] only)
//!
//! [`rank`] stops after step 5 so that callers can replace candidates that
//! later turn out to be unusable.

use std::fmt;

use tracing::debug;

use crate::country::CountryId;
use crate::endpoint::{Endpoint, WIREGUARD_IDENTIFIER};
use crate::error::{Error, Result};

/// Upper bound on the number of selected endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxCount {
    /// At most this many endpoints
    Limited(usize),
    /// Every matching endpoint
    Unbounded,
}

impl MaxCount {
    /// Sentinel used by the configuration surface for "no limit"
    pub const UNBOUNDED_SENTINEL: i64 = -1;

    /// Interpret a raw requested count (`-1` meaning unbounded)
    pub fn from_raw(raw: i64) -> Result<Self> {
        match raw {
            Self::UNBOUNDED_SENTINEL => Ok(MaxCount::Unbounded),
            n if n >= 0 => Ok(MaxCount::Limited(n as usize)),
            n => Err(Error::config(format!(
                "requested count must be -1 (unbounded) or non-negative, got {}",
                n
            ))),
        }
    }

    /// Whether `count` items already satisfy the bound
    pub fn is_reached(self, count: usize) -> bool {
        match self {
            MaxCount::Limited(max) => count >= max,
            MaxCount::Unbounded => false,
        }
    }
}

impl fmt::Display for MaxCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxCount::Limited(n) => write!(f, "{}", n),
            MaxCount::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Ordering of the selected endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionOrder {
    /// Ascending load, ties kept in directory order
    #[default]
    LeastLoaded,
    /// Directory order
    AsListed,
}

/// Filters and ordering applied to the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Required technology identifier
    pub protocol: String,
    /// Allowed countries; empty disables the filter
    pub countries: Vec<CountryId>,
    /// Allowed group titles; empty disables the filter
    pub groups: Vec<String>,
    /// Output ordering
    pub order: SelectionOrder,
    /// Output cap
    pub max_count: MaxCount,
}

impl SelectionCriteria {
    /// Criteria for online wireguard endpoints, no location or group filter
    pub fn new() -> Self {
        Self {
            protocol: WIREGUARD_IDENTIFIER.to_string(),
            countries: Vec::new(),
            groups: Vec::new(),
            order: SelectionOrder::LeastLoaded,
            max_count: MaxCount::Limited(1),
        }
    }

    /// Restrict to endpoints located in one of `countries`
    pub fn with_countries(mut self, countries: Vec<CountryId>) -> Self {
        self.countries = countries;
        self
    }

    /// Restrict to endpoints in one of the `groups`
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Set the output ordering
    pub fn with_order(mut self, order: SelectionOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the output cap
    pub fn with_max_count(mut self, max_count: MaxCount) -> Self {
        self.max_count = max_count;
        self
    }

    /// Whether an endpoint passes every active filter
    pub fn matches(&self, endpoint: &Endpoint) -> bool {
        endpoint.is_online_for(&self.protocol)
            && (self.groups.is_empty() || endpoint.in_any_group(&self.groups))
            && (self.countries.is_empty() || endpoint.in_any_country(&self.countries))
    }

    /// Human-readable summary of the active filters
    pub fn describe(&self) -> String {
        let countries = if self.countries.is_empty() {
            "all".to_string()
        } else {
            join(&self.countries)
        };

        if self.groups.is_empty() {
            format!("countries: {}", countries)
        } else {
            format!("countries: {}; groups: {}", countries, self.groups.join(", "))
        }
    }
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self::new()
    }
}

fn join(countries: &[CountryId]) -> String {
    countries
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Filter and order endpoints without applying the output cap.
///
/// # Errors
///
/// [`Error::NoMatch`] when no endpoint passes the filters.
pub fn rank<'a, I>(endpoints: I, criteria: &SelectionCriteria) -> Result<Vec<&'a Endpoint>>
where
    I: IntoIterator<Item = &'a Endpoint>,
{
    let mut retained: Vec<&Endpoint> = endpoints
        .into_iter()
        .filter(|e| e.is_online_for(&criteria.protocol))
        .collect();
    debug!("{} endpoint(s) online for {}", retained.len(), criteria.protocol);

    if !criteria.groups.is_empty() {
        retained.retain(|e| e.in_any_group(&criteria.groups));
        debug!("{} endpoint(s) left after group filter", retained.len());
    }

    if !criteria.countries.is_empty() {
        retained.retain(|e| e.in_any_country(&criteria.countries));
        debug!("{} endpoint(s) left after country filter", retained.len());
    }

    if retained.is_empty() {
        return Err(Error::no_match(criteria.describe()));
    }

    if criteria.order == SelectionOrder::LeastLoaded {
        // sort_by_key is stable: equal loads keep directory order
        retained.sort_by_key(|e| e.load);
    }

    Ok(retained)
}

/// Filter, order and cap endpoints.
///
/// # Errors
///
/// [`Error::NoMatch`] when no endpoint passes the filters.
pub fn select<'a, I>(endpoints: I, criteria: &SelectionCriteria) -> Result<Vec<&'a Endpoint>>
where
    I: IntoIterator<Item = &'a Endpoint>,
{
    let mut ranked = rank(endpoints, criteria)?;
    if let MaxCount::Limited(max) = criteria.max_count {
        ranked.truncate(max);
    }
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{Country, Group, Location, Metadata, Pivot, Technology};

    fn endpoint(name: &str, load: u32, country: u32, status: &str) -> Endpoint {
        Endpoint {
            id: 0,
            name: name.to_string(),
            hostname: format!("{}.nordvpn.com", name),
            station: None,
            load,
            technologies: vec![Technology {
                id: 35,
                identifier: WIREGUARD_IDENTIFIER.to_string(),
                name: "Wireguard".to_string(),
                metadata: vec![Metadata {
                    name: "public_key".to_string(),
                    value: format!("{}-key", name),
                }],
                pivot: Some(Pivot {
                    status: status.to_string(),
                }),
            }],
            groups: vec![Group {
                id: 11,
                title: "Standard VPN servers".to_string(),
                identifier: "legacy_standard".to_string(),
            }],
            services: Vec::new(),
            locations: vec![Location {
                id: 1,
                country: Country {
                    id: country,
                    name: String::new(),
                    code: String::new(),
                },
            }],
        }
    }

    fn names(selected: &[&Endpoint]) -> Vec<String> {
        selected.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_max_count_from_raw() {
        assert_eq!(MaxCount::from_raw(-1).unwrap(), MaxCount::Unbounded);
        assert_eq!(MaxCount::from_raw(3).unwrap(), MaxCount::Limited(3));
        assert!(MaxCount::from_raw(-2).is_err());
        assert!(MaxCount::Limited(2).is_reached(2));
        assert!(!MaxCount::Unbounded.is_reached(usize::MAX));
    }

    #[test]
    fn test_offline_endpoints_are_dropped() {
        let list = vec![
            endpoint("ca1", 10, 38, "online"),
            endpoint("ca2", 5, 38, "offline"),
        ];
        let criteria = SelectionCriteria::new().with_max_count(MaxCount::Unbounded);

        let selected = select(&list, &criteria).unwrap();
        assert_eq!(names(&selected), vec!["ca1"]);
    }

    #[test]
    fn test_online_other_protocol_does_not_count() {
        let mut ep = endpoint("ca1", 10, 38, "offline");
        ep.technologies.push(Technology {
            id: 3,
            identifier: "openvpn_udp".to_string(),
            name: String::new(),
            metadata: Vec::new(),
            pivot: Some(Pivot {
                status: "online".to_string(),
            }),
        });
        let list = vec![ep];

        let err = select(&list, &SelectionCriteria::new()).unwrap_err();
        assert!(matches!(err, Error::NoMatch { .. }));
    }

    #[test]
    fn test_least_loaded_is_stable() {
        let list = vec![
            endpoint("a", 30, 38, "online"),
            endpoint("b", 10, 38, "online"),
            endpoint("c", 30, 38, "online"),
            endpoint("d", 10, 38, "online"),
        ];
        let criteria = SelectionCriteria::new().with_max_count(MaxCount::Unbounded);

        let selected = select(&list, &criteria).unwrap();
        assert_eq!(names(&selected), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_as_listed_keeps_input_order() {
        let list = vec![
            endpoint("a", 30, 38, "online"),
            endpoint("b", 10, 38, "online"),
        ];
        let criteria = SelectionCriteria::new()
            .with_order(SelectionOrder::AsListed)
            .with_max_count(MaxCount::Unbounded);

        assert_eq!(names(&select(&list, &criteria).unwrap()), vec!["a", "b"]);
    }

    #[test]
    fn test_group_filter() {
        let mut p2p = endpoint("p2p", 50, 38, "online");
        p2p.groups.push(Group {
            id: 15,
            title: "P2P".to_string(),
            identifier: "legacy_p2p".to_string(),
        });
        let list = vec![endpoint("plain", 1, 38, "online"), p2p];
        let criteria = SelectionCriteria::new().with_groups(vec!["P2P".to_string()]);

        assert_eq!(names(&select(&list, &criteria).unwrap()), vec!["p2p"]);
    }

    #[test]
    fn test_endpoint_without_location() {
        let mut nowhere = endpoint("nowhere", 1, 38, "online");
        nowhere.locations.clear();
        let list = vec![nowhere];

        let unfiltered = SelectionCriteria::new();
        assert_eq!(names(&select(&list, &unfiltered).unwrap()), vec!["nowhere"]);

        let filtered = SelectionCriteria::new().with_countries(vec![CountryId::Canada]);
        assert!(matches!(
            select(&list, &filtered),
            Err(Error::NoMatch { .. })
        ));
    }

    #[test]
    fn test_no_match_names_filter() {
        let list = vec![endpoint("ca1", 10, 38, "online")];
        let criteria = SelectionCriteria::new().with_countries(vec![CountryId::France]);

        match select(&list, &criteria) {
            Err(Error::NoMatch { filter }) => assert_eq!(filter, "countries: France"),
            other => panic!("expected NoMatch, got {:?}", other),
        }
    }

    #[test]
    fn test_rank_ignores_cap() {
        let list = vec![
            endpoint("a", 3, 38, "online"),
            endpoint("b", 2, 38, "online"),
            endpoint("c", 1, 38, "online"),
        ];
        let criteria = SelectionCriteria::new().with_max_count(MaxCount::Limited(1));

        assert_eq!(names(&rank(&list, &criteria).unwrap()), vec!["c", "b", "a"]);
        assert_eq!(names(&select(&list, &criteria).unwrap()), vec!["c"]);
    }

    #[test]
    fn test_describe() {
        let criteria = SelectionCriteria::new()
            .with_countries(vec![CountryId::Canada, CountryId::UnitedStates])
            .with_groups(vec!["P2P".to_string()]);
        assert_eq!(
            criteria.describe(),
            "countries: Canada, UnitedStates; groups: P2P"
        );
        assert_eq!(SelectionCriteria::new().describe(), "countries: all");
    }

    #[test]
    fn test_matches_agrees_with_select() {
        let list = vec![
            endpoint("a", 3, 38, "online"),
            endpoint("b", 2, 74, "online"),
            endpoint("c", 1, 38, "offline"),
        ];
        let criteria = SelectionCriteria::new()
            .with_countries(vec![CountryId::Canada])
            .with_max_count(MaxCount::Unbounded);

        let selected = select(&list, &criteria).unwrap();
        for ep in &list {
            assert_eq!(criteria.matches(ep), selected.contains(&ep));
        }
    }
}
