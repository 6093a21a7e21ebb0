use crate::analysis::reading::EnergyReading;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct FeederGroup {
    pub feeder_name: String,
    /// Ascending by timestamp; ties keep file order.
    pub readings: Vec<EnergyReading>,
}

/// Groups readings by exact feeder name, in order of first appearance.
///
/// Names are compared byte for byte: "Feeder 1" and "feeder 1 " end up in
/// different groups.
pub fn group_by_feeder(readings: Vec<EnergyReading>) -> Vec<FeederGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<FeederGroup> = Vec::new();

    for reading in readings {
        match index.get(&reading.feeder_name) {
            Some(&i) => groups[i].readings.push(reading),
            None => {
                index.insert(reading.feeder_name.clone(), groups.len());
                groups.push(FeederGroup {
                    feeder_name: reading.feeder_name.clone(),
                    readings: vec![reading],
                });
            }
        }
    }

    for group in &mut groups {
        group.readings.sort_by_key(|r| r.timestamp);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn reading(feeder: &str, hour: u32, consumption: f64) -> EnergyReading {
        EnergyReading::new(
            Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            feeder,
            consumption,
            230.0,
            5.0,
        )
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let groups = group_by_feeder(vec![
            reading("B", 1, 1.0),
            reading("A", 1, 2.0),
            reading("B", 2, 3.0),
        ]);

        let names: Vec<&str> = groups.iter().map(|g| g.feeder_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(groups[0].readings.len(), 2);
        assert_eq!(groups[1].readings.len(), 1);
    }

    #[test]
    fn test_sorts_each_group_by_timestamp() {
        let groups = group_by_feeder(vec![
            reading("A", 5, 5.0),
            reading("A", 1, 1.0),
            reading("A", 3, 3.0),
        ]);

        let consumption: Vec<f64> = groups[0].readings.iter().map(|r| r.consumption).collect();
        assert_eq!(consumption, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_equal_timestamps_keep_file_order() {
        let groups = group_by_feeder(vec![
            reading("A", 2, 20.0),
            reading("A", 1, 10.0),
            reading("A", 2, 21.0),
        ]);

        let consumption: Vec<f64> = groups[0].readings.iter().map(|r| r.consumption).collect();
        assert_eq!(consumption, vec![10.0, 20.0, 21.0]);
    }

    #[test]
    fn test_names_are_not_normalised() {
        let groups = group_by_feeder(vec![
            reading("Feeder 1", 1, 1.0),
            reading("feeder 1", 1, 1.0),
            reading("Feeder 1 ", 1, 1.0),
        ]);

        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_no_readings_no_groups() {
        assert!(group_by_feeder(Vec::new()).is_empty());
    }
}
