//! Country identifiers
//!
//! The provider identifies countries by a numeric id. [`CountryId`] is the
//! closed set of countries this tool knows by name, together with their ISO
//! 3166-1 alpha-2 codes.
//!
//! ## Token lookup
//!
//! User-supplied tokens are matched case-insensitively, ignoring spaces,
//! underscores and hyphens, against either the canonical name or the ISO
//! code: `"United States"`, `"united_states"`, `"UnitedStates"` and `"us"`
//! all resolve to [`CountryId::UnitedStates`]. Tokens that match nothing are
//! reported back to the caller and logged; they never fail the whole list.

use std::fmt;
use tracing::{debug, warn};

macro_rules! countries {
    ($($variant:ident = $id:literal, $code:literal;)+) => {
        /// A country known to the provider directory
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum CountryId {
            $($variant,)+
        }

        impl CountryId {
            /// Every known country, in declaration order
            pub const ALL: &'static [CountryId] = &[$(CountryId::$variant,)+];

            /// Provider numeric id
            pub fn id(self) -> u32 {
                match self {
                    $(CountryId::$variant => $id,)+
                }
            }

            /// Canonical name (the form used in generated file names)
            pub fn name(self) -> &'static str {
                match self {
                    $(CountryId::$variant => stringify!($variant),)+
                }
            }

            /// ISO 3166-1 alpha-2 code
            pub fn code(self) -> &'static str {
                match self {
                    $(CountryId::$variant => $code,)+
                }
            }

            /// Look up a country by provider numeric id
            pub fn from_id(id: u32) -> Option<Self> {
                match id {
                    $($id => Some(CountryId::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

countries! {
    Albania = 2, "AL";
    Argentina = 10, "AR";
    Australia = 13, "AU";
    Austria = 14, "AT";
    Belgium = 21, "BE";
    BosniaAndHerzegovina = 27, "BA";
    Brazil = 30, "BR";
    Bulgaria = 33, "BG";
    Canada = 38, "CA";
    Chile = 43, "CL";
    Colombia = 47, "CO";
    CostaRica = 52, "CR";
    Croatia = 54, "HR";
    Cyprus = 56, "CY";
    CzechRepublic = 57, "CZ";
    Denmark = 58, "DK";
    Estonia = 68, "EE";
    Finland = 73, "FI";
    France = 74, "FR";
    Georgia = 80, "GE";
    Germany = 81, "DE";
    Greece = 84, "GR";
    HongKong = 97, "HK";
    Hungary = 98, "HU";
    Iceland = 99, "IS";
    India = 100, "IN";
    Indonesia = 101, "ID";
    Ireland = 104, "IE";
    Israel = 105, "IL";
    Italy = 106, "IT";
    Japan = 108, "JP";
    SouthKorea = 114, "KR";
    Latvia = 119, "LV";
    Lithuania = 125, "LT";
    Luxembourg = 126, "LU";
    NorthMacedonia = 128, "MK";
    Malaysia = 131, "MY";
    Mexico = 140, "MX";
    Moldova = 142, "MD";
    Netherlands = 153, "NL";
    NewZealand = 156, "NZ";
    Norway = 163, "NO";
    Poland = 174, "PL";
    Portugal = 175, "PT";
    Romania = 179, "RO";
    Serbia = 192, "RS";
    Singapore = 195, "SG";
    Slovakia = 196, "SK";
    Slovenia = 197, "SI";
    SouthAfrica = 200, "ZA";
    Spain = 202, "ES";
    Sweden = 208, "SE";
    Switzerland = 209, "CH";
    Taiwan = 211, "TW";
    Thailand = 214, "TH";
    Turkey = 220, "TR";
    Ukraine = 225, "UA";
    UnitedArabEmirates = 226, "AE";
    UnitedKingdom = 227, "GB";
    UnitedStates = 228, "US";
    Vietnam = 234, "VN";
}

impl CountryId {
    /// Look up a country from a user-supplied token.
    ///
    /// Returns `None` for empty or unrecognized tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        let needle = normalize(token);
        if needle.is_empty() {
            return None;
        }

        Self::ALL.iter().copied().find(|country| {
            normalize(country.name()) == needle || country.code().eq_ignore_ascii_case(&needle)
        })
    }
}

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(token: &str) -> String {
    token
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Outcome of parsing a comma-separated list of country tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryList {
    /// Recognized countries, deduplicated, in input order
    pub countries: Vec<CountryId>,
    /// Tokens that did not match any known country (trimmed)
    pub rejected: Vec<String>,
}

/// Parse a comma-separated country list.
///
/// Blank entries are ignored. Each unrecognized token is logged as a warning
/// and collected in [`CountryList::rejected`].
pub fn parse_country_list(raw: &str) -> CountryList {
    let mut list = CountryList::default();

    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match CountryId::from_token(token) {
            Some(country) => {
                debug!("Location found: '{}' -> {}", token, country);
                if !list.countries.contains(&country) {
                    list.countries.push(country);
                }
            }
            None => {
                warn!("Failed to parse location: '{}', ignoring it", token);
                list.rejected.push(token.to_string());
            }
        }
    }

    list
}
