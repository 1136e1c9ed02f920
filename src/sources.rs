// Raw records handed to the engine and the collaborators that provide them
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::exercise_groups::ExerciseGroupMembership;
use crate::units::{DistanceUnit, WeightUnit};

/// One day of nutrition tracking.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DietLog {
    pub date: NaiveDate,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Body weight and body fat reading.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyMeasurementEntry {
    pub id: i64,
    pub date: NaiveDateTime,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    #[serde(default)]
    pub body_fat_percentage: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementType {
    Caliper,
    Circumference,
}

/// A user defined body measurement such as "Left Biceps".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: i64,
    pub name: String,
    pub measurement_type: MeasurementType,
}

/// One value inside a measurement entry's JSON blob. The unit stays raw so
/// that a value with an unknown unit can be skipped on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementValue {
    pub value: f64,
    pub unit: String,
    pub measurement_type: MeasurementType,
}

/// A session of body measurements. `measurement_values` maps measurement ids
/// (as strings) to their values and is stored as a JSON string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementEntry {
    pub id: i64,
    pub date: NaiveDateTime,
    pub measurement_values: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl MeasurementEntry {
    /// Decode the value blob. A malformed blob yields an empty map.
    pub fn values(&self) -> BTreeMap<i64, MeasurementValue> {
        let raw: BTreeMap<String, MeasurementValue> =
            match serde_json::from_str(&self.measurement_values) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("Skipping measurement values of entry {}: {e}", self.id);
                    return BTreeMap::new();
                }
            };
        raw.into_iter()
            .filter_map(|(k, v)| k.parse().ok().map(|id| (id, v)))
            .collect()
    }

    pub fn measurement_ids(&self) -> BTreeSet<i64> {
        self.values().into_keys().collect()
    }
}

/// A completed set with whatever it tracked.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletedSet {
    pub id: i64,
    pub exercise_id: i64,
    pub workout_id: i64,
    pub time_completed: NaiveDateTime,
    pub is_warmup: bool,
    pub multiset_id: i64,
    pub is_tracking_weight: bool,
    pub weight: f64,
    pub weight_unit: WeightUnit,
    pub is_tracking_reps: bool,
    pub reps: f64,
    pub is_tracking_partial_reps: bool,
    pub partial_reps: f64,
    pub is_tracking_distance: bool,
    pub distance: f64,
    pub distance_unit: DistanceUnit,
    pub is_tracking_time: bool,
    pub time_in_seconds: f64,
    pub is_tracking_rir: bool,
    pub rir: f64,
    pub is_tracking_rpe: bool,
    pub rpe: f64,
    pub is_tracking_resistance_level: bool,
    pub resistance_level: f64,
    pub is_tracking_user_weight: bool,
    pub user_weight: f64,
    pub user_weight_unit: WeightUnit,
    pub comment: Option<String>,
    pub workout_comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    /// Comma separated primary group tags, e.g. `"chest,triceps"`.
    #[serde(default)]
    pub primary_groups: String,
    /// Comma separated `<tag>x<multiplier>` pairs, e.g. `"shouldersx0.5"`.
    #[serde(default)]
    pub secondary_groups: Option<String>,
}

impl Exercise {
    pub fn membership(&self) -> ExerciseGroupMembership {
        ExerciseGroupMembership {
            exercise_id: self.id,
            primary: crate::exercise_groups::parse_primary_groups(&self.primary_groups),
            secondary: self
                .secondary_groups
                .as_deref()
                .map(crate::exercise_groups::parse_secondary_groups),
        }
    }
}

/// A named calendar range such as a training block or a diet phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub id: i64,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    /// `None` while the period is ongoing.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Supplies raw records to a session.
pub trait RecordSource {
    /// Diet logs ordered by date. With `only_with_values` logs without any
    /// nutrition value are left out.
    fn diet_logs(&self, only_with_values: bool) -> Vec<DietLog>;
    /// Body measurement entries ordered by time, earliest first.
    fn body_measurements(&self) -> Vec<BodyMeasurementEntry>;
    /// Measurement entries containing a value for `measurement_id`.
    fn measurement_entries(&self, measurement_id: i64) -> Vec<MeasurementEntry>;
    fn completed_sets_for_exercise(&self, exercise_id: i64) -> Vec<CompletedSet>;
    fn exercises(&self) -> Vec<Exercise>;
    fn measurements(&self) -> Vec<Measurement>;
    fn time_periods(&self) -> Vec<TimePeriod>;

    fn exercise(&self, id: i64) -> Option<Exercise> {
        self.exercises().into_iter().find(|e| e.id == id)
    }

    fn measurement(&self, id: i64) -> Option<Measurement> {
        self.measurements().into_iter().find(|m| m.id == id)
    }

    fn time_period(&self, id: i64) -> Option<TimePeriod> {
        self.time_periods().into_iter().find(|p| p.id == id)
    }
}

/// Records kept in memory, typically deserialized from a JSON dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemorySource {
    pub diet_logs: Vec<DietLog>,
    pub body_measurements: Vec<BodyMeasurementEntry>,
    pub measurements: Vec<Measurement>,
    pub measurement_entries: Vec<MeasurementEntry>,
    pub completed_sets: Vec<CompletedSet>,
    pub exercises: Vec<Exercise>,
    pub time_periods: Vec<TimePeriod>,
}

impl RecordSource for InMemorySource {
    fn diet_logs(&self, only_with_values: bool) -> Vec<DietLog> {
        let mut logs: Vec<DietLog> = self
            .diet_logs
            .iter()
            .filter(|l| {
                !only_with_values
                    || l.calories > 0.0
                    || l.fat.is_some()
                    || l.carbs.is_some()
                    || l.protein.is_some()
            })
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.date);
        logs
    }

    fn body_measurements(&self) -> Vec<BodyMeasurementEntry> {
        let mut entries = self.body_measurements.clone();
        entries.sort_by_key(|e| e.date);
        entries
    }

    fn measurement_entries(&self, measurement_id: i64) -> Vec<MeasurementEntry> {
        let mut entries: Vec<MeasurementEntry> = self
            .measurement_entries
            .iter()
            .filter(|e| e.measurement_ids().contains(&measurement_id))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.date);
        entries
    }

    fn completed_sets_for_exercise(&self, exercise_id: i64) -> Vec<CompletedSet> {
        self.completed_sets
            .iter()
            .filter(|s| s.exercise_id == exercise_id)
            .cloned()
            .collect()
    }

    fn exercises(&self) -> Vec<Exercise> {
        self.exercises.clone()
    }

    fn measurements(&self) -> Vec<Measurement> {
        self.measurements.clone()
    }

    fn time_periods(&self) -> Vec<TimePeriod> {
        self.time_periods.clone()
    }
}
