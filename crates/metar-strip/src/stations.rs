//! Station id → LED position assignment.

use std::collections::HashMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StationMapError {
    #[error("LED position {position} assigned to both {first} and {second}")]
    DuplicatePosition {
        position: usize,
        first: String,
        second: String,
    },
    #[error("station {0} assigned twice")]
    DuplicateStation(String),
}

/// Immutable mapping from station id to LED position.
///
/// Positions are unique. Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationIndexMap {
    entries: Vec<(String, usize)>,
    by_station: HashMap<String, usize>,
}

impl StationIndexMap {
    pub fn new(
        entries: impl IntoIterator<Item = (String, usize)>,
    ) -> Result<Self, StationMapError> {
        let mut map = Self::default();
        let mut owners: HashMap<usize, String> = HashMap::new();
        for (station, position) in entries {
            if map.by_station.contains_key(&station) {
                return Err(StationMapError::DuplicateStation(station));
            }
            if let Some(first) = owners.get(&position) {
                return Err(StationMapError::DuplicatePosition {
                    position,
                    first: first.clone(),
                    second: station,
                });
            }
            owners.insert(position, station.clone());
            map.by_station.insert(station.clone(), position);
            map.entries.push((station, position));
        }
        Ok(map)
    }

    /// Walk `station_ids` in order handing out positions.
    ///
    /// A station with an explicit position resets the counter to it; any
    /// other station takes the position after the previous one. Explicit
    /// stations that are not in `station_ids` are appended at the end.
    pub fn assign(
        station_ids: &[String],
        explicit: &[(String, usize)],
    ) -> Result<Self, StationMapError> {
        let pinned: HashMap<&str, usize> =
            explicit.iter().map(|(id, p)| (id.as_str(), *p)).collect();
        let mut assigned: HashMap<&str, usize> = HashMap::new();
        let mut entries = Vec::new();
        let mut next = 0;

        for id in station_ids {
            // A repeat keeps its first position and leaves the counter alone.
            if assigned.contains_key(id.as_str()) {
                continue;
            }
            let position = pinned.get(id.as_str()).copied().unwrap_or(next);
            next = position + 1;
            assigned.insert(id.as_str(), position);
            entries.push((id.clone(), position));
        }
        for (id, position) in explicit {
            if !assigned.contains_key(id.as_str()) {
                assigned.insert(id.as_str(), *position);
                entries.push((id.clone(), *position));
            }
        }

        Self::new(entries)
    }

    pub fn position(&self, station_id: &str) -> Option<usize> {
        self.by_station.get(station_id).copied()
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(_, p)| *p)
    }

    pub fn station_ids(&self) -> Vec<String> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.entries.iter().map(|(id, p)| (id.as_str(), *p))
    }

    pub fn max_position(&self) -> Option<usize> {
        self.positions().max()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sequential_assignment() {
        let map = StationIndexMap::assign(&ids(&["KBOS", "KJFK", "KSFO"]), &[]).unwrap();
        assert_eq!(map.position("KBOS"), Some(0));
        assert_eq!(map.position("KJFK"), Some(1));
        assert_eq!(map.position("KSFO"), Some(2));
        assert_eq!(map.station_ids(), ids(&["KBOS", "KJFK", "KSFO"]));
    }

    #[test]
    fn explicit_position_resets_counter() {
        let explicit = vec![("KJFK".to_string(), 10)];
        let map =
            StationIndexMap::assign(&ids(&["KBOS", "KJFK", "KSFO", "KORD"]), &explicit).unwrap();
        assert_eq!(map.position("KBOS"), Some(0));
        assert_eq!(map.position("KJFK"), Some(10));
        assert_eq!(map.position("KSFO"), Some(11));
        assert_eq!(map.position("KORD"), Some(12));
    }

    #[test]
    fn repeated_station_keeps_first_position() {
        let map = StationIndexMap::assign(&ids(&["KBOS", "KJFK", "KBOS", "KSFO"]), &[]).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.position("KBOS"), Some(0));
        assert_eq!(map.position("KJFK"), Some(1));
        assert_eq!(map.position("KSFO"), Some(2));
        assert_eq!(map.station_ids(), ids(&["KBOS", "KJFK", "KSFO"]));
    }

    #[test]
    fn repeat_after_explicit_reset_does_not_rewind() {
        let explicit = vec![("KJFK".to_string(), 10)];
        let map = StationIndexMap::assign(&ids(&["KBOS", "KJFK", "KBOS", "KSFO"]), &explicit)
            .unwrap();
        assert_eq!(map.position("KBOS"), Some(0));
        assert_eq!(map.position("KJFK"), Some(10));
        assert_eq!(map.position("KSFO"), Some(11));
    }

    #[test]
    fn explicit_only_station_is_kept() {
        let explicit = vec![("KLAX".to_string(), 40)];
        let map = StationIndexMap::assign(&ids(&["KBOS"]), &explicit).unwrap();
        assert_eq!(map.station_ids(), ids(&["KBOS", "KLAX"]));
        assert_eq!(map.max_position(), Some(40));
    }

    #[test]
    fn colliding_positions_are_rejected() {
        let explicit = vec![("KSFO".to_string(), 1)];
        let err = StationIndexMap::assign(&ids(&["KBOS", "KJFK", "KSFO"]), &explicit).unwrap_err();
        assert_eq!(
            err,
            StationMapError::DuplicatePosition {
                position: 1,
                first: "KJFK".to_string(),
                second: "KSFO".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_station_in_explicit_entries() {
        let err = StationIndexMap::new(vec![("KBOS".to_string(), 0), ("KBOS".to_string(), 1)])
            .unwrap_err();
        assert_eq!(err, StationMapError::DuplicateStation("KBOS".to_string()));
    }
}
