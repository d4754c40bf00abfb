//! # Station Registry
//!
//! Compiled-in station data: the stations this board knows by nickname, the
//! alternate ids some feeds emit for them, and the direction exceptions for
//! routes whose predictions arrive without a direction.
//!
//! ## Canonicalization
//!
//! Feeds sometimes report a platform-specific or legacy id for a stop. Every
//! id is passed through the duplicate-id map before lookup. The map is
//! validated at construction so that no alias points at another alias, which
//! makes canonicalization idempotent.
//!
//! ## Lifetime
//!
//! Built once at process start and shared read-only (`Arc`) with the
//! normalizer and render engine. Nothing here is mutated after construction.

use crate::glyphs::{self, RenderError};
use crate::Direction;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Longest nickname the header and row layout can accommodate.
pub const MAX_NICKNAME_LEN: usize = 10;

/// Widest nickname in pixels. Leaves room on a row for an interchange badge
/// and a two-digit minutes column.
pub const MAX_NICKNAME_WIDTH: i32 = 48;

/// Errors raised while validating registry data.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Two stations share a primary id
    #[error("duplicate station id: {0}")]
    DuplicateStation(String),

    /// A nickname would not fit the allotted width
    #[error("nickname {nickname:?} for {station_id} exceeds {MAX_NICKNAME_LEN} characters")]
    NicknameTooLong {
        station_id: String,
        nickname: String,
    },

    /// A nickname is drawn wider than [`MAX_NICKNAME_WIDTH`]
    #[error("nickname {nickname:?} for {station_id} is {width} px wide, limit {MAX_NICKNAME_WIDTH}")]
    NicknameTooWide {
        station_id: String,
        nickname: String,
        width: i32,
    },

    /// A nickname uses a character the glyph atlas lacks
    #[error("nickname for {station_id} cannot be drawn: {source}")]
    UnrenderableNickname {
        station_id: String,
        source: RenderError,
    },

    /// An alias maps onto another alias, or shadows a primary id
    #[error("alias {alias} -> {target} is not canonical")]
    ChainedAlias { alias: String, target: String },

    /// An alias points at an id no station has
    #[error("alias {alias} -> {target} names no station")]
    UnknownAliasTarget { alias: String, target: String },
}

/// An immutable station record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Station {
    /// Primary NaPTAN id of the stop
    pub station_id: String,
    /// Short display name (at most [`MAX_NICKNAME_LEN`] characters)
    pub nickname: String,
    /// Operator's three-letter code
    pub code: String,
    /// Selects the underground roundel in the header
    pub is_underground: bool,
}

impl Station {
    pub fn new(station_id: &str, nickname: &str, code: &str, is_underground: bool) -> Self {
        Self {
            station_id: station_id.to_string(),
            nickname: nickname.to_string(),
            code: code.to_string(),
            is_underground,
        }
    }
}

/// Stations by primary id, plus the duplicate-id map.
#[derive(Debug, Clone)]
pub struct StationRegistry {
    by_id: HashMap<String, Station>,
    aliases: HashMap<String, String>,
}

impl StationRegistry {
    /// Build and validate a registry.
    ///
    /// # Errors
    /// - [`RegistryError::DuplicateStation`] if two stations share an id
    /// - [`RegistryError::NicknameTooLong`] or [`RegistryError::NicknameTooWide`]
    ///   if a nickname exceeds the character or pixel limit
    /// - [`RegistryError::UnrenderableNickname`] if a nickname cannot be drawn
    /// - [`RegistryError::ChainedAlias`] if an alias target is itself an
    ///   alias, or an alias key is also a primary id
    /// - [`RegistryError::UnknownAliasTarget`] if an alias target is not a
    ///   station id
    pub fn new(
        stations: Vec<Station>,
        aliases: Vec<(&str, &str)>,
    ) -> Result<Self, RegistryError> {
        let mut by_id = HashMap::with_capacity(stations.len());
        for station in stations {
            if station.nickname.chars().count() > MAX_NICKNAME_LEN {
                return Err(RegistryError::NicknameTooLong {
                    station_id: station.station_id,
                    nickname: station.nickname,
                });
            }
            let width = glyphs::text_width(&station.nickname).map_err(|source| {
                RegistryError::UnrenderableNickname {
                    station_id: station.station_id.clone(),
                    source,
                }
            })?;
            if width > MAX_NICKNAME_WIDTH {
                return Err(RegistryError::NicknameTooWide {
                    station_id: station.station_id,
                    nickname: station.nickname,
                    width,
                });
            }
            if by_id.contains_key(&station.station_id) {
                return Err(RegistryError::DuplicateStation(station.station_id));
            }
            by_id.insert(station.station_id.clone(), station);
        }

        let aliases: HashMap<String, String> = aliases
            .into_iter()
            .map(|(alias, target)| (alias.to_string(), target.to_string()))
            .collect();

        for (alias, target) in &aliases {
            if aliases.contains_key(target) || by_id.contains_key(alias) {
                return Err(RegistryError::ChainedAlias {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
            if !by_id.contains_key(target) {
                return Err(RegistryError::UnknownAliasTarget {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }

        debug!(
            stations = by_id.len(),
            aliases = aliases.len(),
            "station registry built"
        );

        Ok(Self { by_id, aliases })
    }

    /// The compiled-in registry used by the board.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(builtin_stations(), BUILTIN_ALIASES.to_vec())
    }

    /// Resolve an alternate id to its primary id; other ids pass through.
    pub fn canonical_id<'a>(&'a self, id: &'a str) -> &'a str {
        self.aliases.get(id).map(String::as_str).unwrap_or(id)
    }

    /// Look up a station by any of its ids.
    pub fn get(&self, id: &str) -> Option<&Station> {
        self.by_id.get(self.canonical_id(id))
    }

    /// Nickname for a destination id, if the station is known.
    pub fn nickname(&self, id: &str) -> Option<&str> {
        self.get(id).map(|station| station.nickname.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterate over all stations (unordered).
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.by_id.values()
    }
}

/// Destinations that count as a given direction when the feed leaves the
/// direction blank, keyed by `(station_id, direction)`.
#[derive(Debug, Clone, Default)]
pub struct DirectionExceptionTable {
    entries: HashMap<(String, Direction), HashSet<String>>,
}

impl DirectionExceptionTable {
    pub fn new(entries: &[(&str, Direction, &[&str])]) -> Self {
        let mut table = HashMap::new();
        for (station_id, direction, destinations) in entries {
            let set: &mut HashSet<String> = table
                .entry((station_id.to_string(), *direction))
                .or_default();
            set.extend(destinations.iter().map(|d| d.to_string()));
        }
        Self { entries: table }
    }

    /// The compiled-in exception table.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_EXCEPTIONS)
    }

    /// True when `destination_id` is listed for `(station_id, direction)`.
    pub fn matches(&self, station_id: &str, direction: Direction, destination_id: &str) -> bool {
        self.entries
            .get(&(station_id.to_string(), direction))
            .is_some_and(|set| set.contains(destination_id))
    }
}

// -- Compiled-in data --

pub const BELSIZE_PARK: &str = "940GZZLUBZP";
pub const HAMPSTEAD_HEATH: &str = "910GHMPSTDH";
pub const KENNINGTON: &str = "940GZZLUKNG";

fn builtin_stations() -> Vec<Station> {
    vec![
        // Northern line
        Station::new("940GZZBPSUST", "battersea", "BPS", true),
        Station::new(BELSIZE_PARK, "belsize", "BZP", true),
        Station::new("940GZZLUBNK", "bank", "BNK", true),
        Station::new("940GZZLUCTN", "camden", "CTN", true),
        Station::new("940GZZLUEFY", "finchley", "EFY", true),
        Station::new("940GZZLUEGW", "edgware", "EGW", true),
        Station::new("940GZZLUEUS", "euston", "EUS", true),
        Station::new("940GZZLUGGN", "golders", "GGN", true),
        Station::new("940GZZLUHBT", "barnet", "HBT", true),
        Station::new("940GZZLUHPS", "hampstead", "HPS", true),
        Station::new(KENNINGTON, "kennington", "KNG", true),
        Station::new("940GZZLUMDN", "morden", "MDN", true),
        Station::new("940GZZLUMHL", "mill hill", "MHE", true),
        Station::new("940GZZLUTCR", "tcr", "TCR", true),
        // Overground
        Station::new("910GCLPHMJ1", "clapham", "CLJ", false),
        Station::new(HAMPSTEAD_HEATH, "heath", "HDH", false),
        Station::new("910GRICHMND", "richmond", "RMD", false),
        Station::new("910GSTFD", "stratford", "SRA", false),
        Station::new("910GWLSDJHL", "willesden", "WIJ", false),
    ]
}

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("940GZZLUBPS", "940GZZBPSUST"),
    ("910GCLPHMJC", "910GCLPHMJ1"),
    ("910GSTFDLL", "910GSTFD"),
    ("910GWLSDNJ", "910GWLSDJHL"),
];

const BUILTIN_EXCEPTIONS: &[(&str, Direction, &[&str])] = &[
    (HAMPSTEAD_HEATH, Direction::Inbound, &["910GSTFD"]),
    (
        HAMPSTEAD_HEATH,
        Direction::Outbound,
        &["910GRICHMND", "910GCLPHMJ1", "910GWLSDJHL"],
    ),
    (KENNINGTON, Direction::Outbound, &["940GZZBPSUST"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let registry = StationRegistry::builtin().unwrap();
        assert!(!registry.is_empty());
        assert!(registry
            .stations()
            .all(|s| s.nickname.chars().count() <= MAX_NICKNAME_LEN));
        assert!(registry
            .stations()
            .all(|s| glyphs::text_width(&s.nickname).unwrap() <= MAX_NICKNAME_WIDTH));
    }

    #[test]
    fn test_rejects_alias_to_missing_station() {
        let stations = vec![Station::new("A", "alpha", "AAA", true)];
        let err = StationRegistry::new(stations, vec![("B", "Z")]).unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownAliasTarget {
                alias: "B".to_string(),
                target: "Z".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_wide_nickname() {
        // Ten characters, but M and W are 5 px each: 50 + 9 gaps
        let stations = vec![Station::new("A", "mwmwmwmwmw", "MWM", true)];
        let err = StationRegistry::new(stations, vec![]).unwrap_err();
        assert!(matches!(err, RegistryError::NicknameTooWide { width: 59, .. }));
    }

    #[test]
    fn test_rejects_unrenderable_nickname() {
        let stations = vec![Station::new("A", "king's x!", "KGX", true)];
        let err = StationRegistry::new(stations, vec![]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnrenderableNickname { ref station_id, .. } if station_id == "A"
        ));
    }

    #[test]
    fn test_alias_resolves_to_primary() {
        let registry = StationRegistry::builtin().unwrap();
        assert_eq!(registry.canonical_id("940GZZLUBPS"), "940GZZBPSUST");
        assert_eq!(registry.nickname("940GZZLUBPS"), Some("battersea"));
        assert_eq!(registry.canonical_id("940GZZLUMDN"), "940GZZLUMDN");
    }

    #[test]
    fn test_canonicalization_is_idempotent_for_builtin_aliases() {
        let registry = StationRegistry::builtin().unwrap();
        for (alias, _) in BUILTIN_ALIASES {
            let once = registry.canonical_id(alias);
            assert_eq!(registry.canonical_id(once), once);
        }
    }

    #[test]
    fn test_unknown_id_misses() {
        let registry = StationRegistry::builtin().unwrap();
        assert_eq!(registry.get("940GZZLUXXX"), None);
        assert_eq!(registry.canonical_id("940GZZLUXXX"), "940GZZLUXXX");
    }

    #[test]
    fn test_rejects_chained_alias() {
        let stations = vec![Station::new("A", "alpha", "AAA", true)];
        let err = StationRegistry::new(stations, vec![("C", "B"), ("B", "A")]).unwrap_err();
        assert!(matches!(err, RegistryError::ChainedAlias { .. }));
    }

    #[test]
    fn test_rejects_alias_shadowing_primary() {
        let stations = vec![
            Station::new("A", "alpha", "AAA", true),
            Station::new("B", "bravo", "BBB", true),
        ];
        let err = StationRegistry::new(stations, vec![("B", "A")]).unwrap_err();
        assert!(matches!(err, RegistryError::ChainedAlias { .. }));
    }

    #[test]
    fn test_rejects_long_nickname() {
        let stations = vec![Station::new("A", "walthamstow", "WHC", true)];
        let err = StationRegistry::new(stations, vec![]).unwrap_err();
        assert!(matches!(err, RegistryError::NicknameTooLong { .. }));
    }

    #[test]
    fn test_rejects_duplicate_station() {
        let stations = vec![
            Station::new("A", "alpha", "AAA", true),
            Station::new("A", "again", "AAA", true),
        ];
        assert_eq!(
            StationRegistry::new(stations, vec![]).unwrap_err(),
            RegistryError::DuplicateStation("A".to_string())
        );
    }

    #[test]
    fn test_direction_exceptions() {
        let table = DirectionExceptionTable::builtin();
        assert!(table.matches(HAMPSTEAD_HEATH, Direction::Inbound, "910GSTFD"));
        assert!(!table.matches(HAMPSTEAD_HEATH, Direction::Outbound, "910GSTFD"));
        assert!(!table.matches(BELSIZE_PARK, Direction::Inbound, "910GSTFD"));
    }
}
