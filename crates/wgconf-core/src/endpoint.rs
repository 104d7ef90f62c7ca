//! Endpoint data model
//!
//! These types mirror the provider's public server directory. They are
//! constructed once from fetched data and only ever read afterwards.
//!
//! ## Wire format
//!
//! ```json
//! {
//!   "id": 929912,
//!   "name": "Canada #1003",
//!   "hostname": "ca1003.nordvpn.com",
//!   "station": "176.113.74.3",
//!   "load": 12,
//!   "technologies": [{
//!     "id": 35,
//!     "identifier": "wireguard_udp",
//!     "metadata": [{ "name": "public_key", "value": "Ab...=" }],
//!     "pivot": { "status": "online" }
//!   }],
//!   "groups": [{ "id": 11, "title": "Standard VPN servers", "identifier": "legacy_standard" }],
//!   "services": [{ "id": 1, "name": "VPN", "identifier": "vpn" }],
//!   "locations": [{ "id": 1, "country": { "id": 38, "name": "Canada", "code": "CA" } }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::country::CountryId;

/// Technology identifier of the tunnel protocol this tool targets
pub const WIREGUARD_IDENTIFIER: &str = "wireguard_udp";

/// Metadata entry name holding the peer public key
pub const PUBLIC_KEY_METADATA: &str = "public_key";

/// A single VPN server entry from the provider directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Provider id
    #[serde(default)]
    pub id: u64,

    /// Display name (e.g. "Canada #1003")
    pub name: String,

    /// Fully qualified hostname
    pub hostname: String,

    /// Station address, when published
    #[serde(default)]
    pub station: Option<String>,

    /// Utilization from 0 to 100, lower is less busy
    #[serde(default)]
    pub load: u32,

    /// Supported tunnel technologies
    #[serde(default)]
    pub technologies: Vec<Technology>,

    /// Group memberships
    #[serde(default)]
    pub groups: Vec<Group>,

    /// Offered services
    #[serde(default)]
    pub services: Vec<Service>,

    /// Geographic locations
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl Endpoint {
    /// First technology entry for the given protocol identifier
    pub fn technology(&self, identifier: &str) -> Option<&Technology> {
        self.technologies
            .iter()
            .find(|t| t.identifier == identifier)
    }

    /// Whether the endpoint runs the given protocol and that entry is online
    pub fn is_online_for(&self, identifier: &str) -> bool {
        self.technologies
            .iter()
            .any(|t| t.identifier == identifier && t.status() == TechnologyStatus::Online)
    }

    /// Non-empty wireguard public key, if published
    pub fn wireguard_public_key(&self) -> Option<&str> {
        self.technology(WIREGUARD_IDENTIFIER)
            .and_then(|t| t.metadata_value(PUBLIC_KEY_METADATA))
            .filter(|key| !key.is_empty())
    }

    /// Whether any group title is in `titles`
    pub fn in_any_group(&self, titles: &[String]) -> bool {
        self.groups.iter().any(|g| titles.contains(&g.title))
    }

    /// Whether any location lies in one of `countries`
    pub fn in_any_country(&self, countries: &[CountryId]) -> bool {
        self.locations
            .iter()
            .any(|l| countries.iter().any(|c| c.id() == l.country.id))
    }

    /// Country of the first location
    pub fn primary_country(&self) -> Option<&Country> {
        self.locations.first().map(|l| &l.country)
    }
}

/// A tunnel technology supported by an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    /// Provider id
    #[serde(default)]
    pub id: u64,

    /// Protocol identifier (e.g. "wireguard_udp")
    pub identifier: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Protocol-specific key/value entries
    #[serde(default)]
    pub metadata: Vec<Metadata>,

    /// Per-endpoint status of this technology
    #[serde(default)]
    pub pivot: Option<Pivot>,
}

impl Technology {
    /// Online/offline status; a missing pivot counts as offline
    pub fn status(&self) -> TechnologyStatus {
        self.pivot
            .as_ref()
            .map(|p| TechnologyStatus::from(p.status.as_str()))
            .unwrap_or(TechnologyStatus::Offline)
    }

    /// Value of the first metadata entry with the given name
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value.as_str())
    }
}

/// Link between an endpoint and a technology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    /// "online" or any other status string
    pub status: String,
}

/// Technology availability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechnologyStatus {
    Online,
    Offline,
}

impl From<&str> for TechnologyStatus {
    fn from(status: &str) -> Self {
        if status.eq_ignore_ascii_case("online") {
            TechnologyStatus::Online
        } else {
            TechnologyStatus::Offline
        }
    }
}

/// Key/value metadata attached to a technology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Group membership label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub identifier: String,
}

/// Service offered by an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub identifier: String,
}

/// Geographic location of an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub id: u64,
    pub country: Country,
}

/// Country as published by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    /// Provider numeric country id
    pub id: u32,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// ISO 3166-1 alpha-2 code
    #[serde(default)]
    pub code: String,
}

impl Country {
    /// Known country for this id, if any
    pub fn known(&self) -> Option<CountryId> {
        CountryId::from_id(self.id)
    }

    /// Identifier used in generated file names.
    ///
    /// The canonical name for known countries, the numeric id otherwise.
    pub fn label(&self) -> String {
        match self.known() {
            Some(country) => country.name().to_string(),
            None => self.id.to_string(),
        }
    }
}
