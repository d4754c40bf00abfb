//! # Arrival Normalizer
//!
//! Turns the unordered feed for one station into the ordered list the board
//! shows:
//!
//! 1. **Canonicalize**: stop and destination ids go through the duplicate-id map
//! 2. **Filter**: keep the requested direction, plus blank-direction records
//!    whose destination is listed in the direction exception table
//! 3. **Sort**: ascending by time to station; ties keep feed order
//!
//! Unknown destinations are kept. Resolving them to a label is the render
//! engine's job. No I/O happens here and nothing can fail.

use crate::stations::{DirectionExceptionTable, Station, StationRegistry};
use crate::{ArrivalRecord, Direction};
use std::sync::Arc;
use tracing::debug;

/// Filters and orders arrivals using the shared, read-only station data.
#[derive(Debug, Clone)]
pub struct Normalizer {
    registry: Arc<StationRegistry>,
    exceptions: Arc<DirectionExceptionTable>,
}

impl Normalizer {
    pub fn new(registry: Arc<StationRegistry>, exceptions: Arc<DirectionExceptionTable>) -> Self {
        Self {
            registry,
            exceptions,
        }
    }

    /// Normalize one poll's worth of arrivals for `station`.
    ///
    /// An empty input yields an empty output, which the render engine shows
    /// as the "service closed" frame.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use tube_countdown_lib::normalizer::Normalizer;
    /// use tube_countdown_lib::stations::{DirectionExceptionTable, StationRegistry, BELSIZE_PARK};
    ///
    /// let registry = Arc::new(StationRegistry::builtin().unwrap());
    /// let normalizer = Normalizer::new(registry.clone(), Arc::new(DirectionExceptionTable::builtin()));
    /// let station = registry.get(BELSIZE_PARK).unwrap();
    ///
    /// assert!(normalizer.normalize(Vec::new(), station, true).is_empty());
    /// ```
    pub fn normalize(
        &self,
        raw_arrivals: Vec<ArrivalRecord>,
        station: &Station,
        requested_inbound: bool,
    ) -> Vec<ArrivalRecord> {
        let direction = Direction::requested(requested_inbound);
        let received = raw_arrivals.len();

        let mut kept: Vec<ArrivalRecord> = raw_arrivals
            .into_iter()
            .map(|record| self.canonicalize(record))
            .filter(|record| self.keep(record, station, direction))
            .collect();

        // Stable: equal times stay in feed order
        kept.sort_by_key(|record| record.time_to_station_seconds);

        debug!(
            station = %station.station_id,
            ?direction,
            received,
            kept = kept.len(),
            "arrivals normalized"
        );

        kept
    }

    fn canonicalize(&self, mut record: ArrivalRecord) -> ArrivalRecord {
        if let Some(primary) = self.primary_for(&record.naptan_id) {
            record.naptan_id = primary;
        }
        if let Some(primary) = self.primary_for(&record.destination_naptan_id) {
            record.destination_naptan_id = primary;
        }
        record
    }

    fn primary_for(&self, id: &str) -> Option<String> {
        let canonical = self.registry.canonical_id(id);
        (canonical != id).then(|| canonical.to_string())
    }

    fn keep(&self, record: &ArrivalRecord, station: &Station, direction: Direction) -> bool {
        match record.direction {
            reported if reported == direction => true,
            Direction::Unknown => self.exceptions.matches(
                &station.station_id,
                direction,
                &record.destination_naptan_id,
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::{BELSIZE_PARK, HAMPSTEAD_HEATH};
    use proptest::prelude::*;

    fn normalizer() -> (Normalizer, Arc<StationRegistry>) {
        let registry = Arc::new(StationRegistry::builtin().unwrap());
        let normalizer = Normalizer::new(
            registry.clone(),
            Arc::new(DirectionExceptionTable::builtin()),
        );
        (normalizer, registry)
    }

    fn arrival(destination: &str, direction: Direction, seconds: u32) -> ArrivalRecord {
        ArrivalRecord {
            naptan_id: HAMPSTEAD_HEATH.to_string(),
            destination_naptan_id: destination.to_string(),
            destination_name: "Somewhere".to_string(),
            direction,
            time_to_station_seconds: seconds,
            platform_name: "Platform 1".to_string(),
            towards: String::new(),
        }
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let (normalizer, registry) = normalizer();
        let station = registry.get(BELSIZE_PARK).unwrap();
        assert!(normalizer.normalize(vec![], station, true).is_empty());
    }

    #[test]
    fn test_filters_by_requested_direction() {
        let (normalizer, registry) = normalizer();
        let station = registry.get(BELSIZE_PARK).unwrap();
        let arrivals = vec![
            arrival("940GZZLUMDN", Direction::Outbound, 60),
            arrival("940GZZLUEGW", Direction::Inbound, 120),
        ];

        let inbound = normalizer.normalize(arrivals.clone(), station, true);
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].destination_naptan_id, "940GZZLUEGW");

        let outbound = normalizer.normalize(arrivals, station, false);
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].destination_naptan_id, "940GZZLUMDN");
    }

    #[test]
    fn test_blank_direction_uses_exception_table() {
        let (normalizer, registry) = normalizer();
        let station = registry.get(HAMPSTEAD_HEATH).unwrap();

        let listed = arrival("910GSTFD", Direction::Unknown, 30);
        let kept = normalizer.normalize(vec![listed], station, true);
        assert_eq!(kept.len(), 1);

        let unlisted = arrival("910GRICHMND", Direction::Unknown, 30);
        assert!(normalizer.normalize(vec![unlisted], station, true).is_empty());
    }

    #[test]
    fn test_exception_matches_after_canonicalization() {
        let (normalizer, registry) = normalizer();
        let station = registry.get(HAMPSTEAD_HEATH).unwrap();

        // Alias of Stratford
        let kept = normalizer.normalize(
            vec![arrival("910GSTFDLL", Direction::Unknown, 30)],
            station,
            true,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].destination_naptan_id, "910GSTFD");
    }

    #[test]
    fn test_unknown_destinations_are_kept() {
        let (normalizer, registry) = normalizer();
        let station = registry.get(BELSIZE_PARK).unwrap();
        let kept = normalizer.normalize(
            vec![arrival("940GZZLUXXX", Direction::Inbound, 10)],
            station,
            true,
        );
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_sort_is_stable() {
        let (normalizer, registry) = normalizer();
        let station = registry.get(BELSIZE_PARK).unwrap();
        let arrivals = vec![
            arrival("940GZZLUEGW", Direction::Inbound, 300),
            arrival("940GZZLUHBT", Direction::Inbound, 60),
            arrival("940GZZLUMHL", Direction::Inbound, 60),
        ];

        let kept = normalizer.normalize(arrivals, station, true);
        let order: Vec<_> = kept
            .iter()
            .map(|a| a.destination_naptan_id.as_str())
            .collect();
        assert_eq!(order, ["940GZZLUHBT", "940GZZLUMHL", "940GZZLUEGW"]);
    }

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Inbound),
            Just(Direction::Outbound),
            Just(Direction::Unknown),
        ]
    }

    proptest! {
        #[test]
        fn prop_output_is_sorted(
            entries in prop::collection::vec((direction_strategy(), 0u32..3600), 0..40),
            inbound in any::<bool>(),
        ) {
            let (normalizer, registry) = normalizer();
            let station = registry.get(HAMPSTEAD_HEATH).unwrap();
            let arrivals = entries
                .into_iter()
                .map(|(direction, seconds)| arrival("910GSTFD", direction, seconds))
                .collect();

            let kept = normalizer.normalize(arrivals, station, inbound);
            prop_assert!(kept
                .windows(2)
                .all(|w| w[0].time_to_station_seconds <= w[1].time_to_station_seconds));
        }
    }
}
