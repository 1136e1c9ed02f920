// Chart series identifiers and the unit families they belong to
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::KeyError;

/// Per-set statistic that can be charted for a single exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseStat {
    WeightMin,
    WeightMax,
    WeightAvg,
    WeightVolume,
    NumSets,
    NumRepsMin,
    NumRepsMax,
    NumRepsAvg,
    NumRepsTotal,
    NumPartialRepsMin,
    NumPartialRepsMax,
    NumPartialRepsAvg,
    NumPartialRepsTotal,
    NumRepsAndPartialRepsMin,
    NumRepsAndPartialRepsMax,
    NumRepsAndPartialRepsAvg,
    NumRepsAndPartialRepsTotal,
    DistanceMin,
    DistanceMax,
    DistanceAvg,
    DistanceTotal,
    TimeMin,
    TimeMax,
    TimeAvg,
    TimeTotal,
    SpeedMin,
    SpeedMax,
    SpeedAvg,
    PaceMin,
    PaceMax,
    PaceAvg,
    RirMin,
    RirMax,
    RirAvg,
    RpeMin,
    RpeMax,
    RpeAvg,
    ResistanceLevelMin,
    ResistanceLevelMax,
    ResistanceLevelAvg,
    SetBodyWeight,
}

pub const ALL_EXERCISE_STATS: [ExerciseStat; 41] = [
    ExerciseStat::WeightMin,
    ExerciseStat::WeightMax,
    ExerciseStat::WeightAvg,
    ExerciseStat::WeightVolume,
    ExerciseStat::NumSets,
    ExerciseStat::NumRepsMin,
    ExerciseStat::NumRepsMax,
    ExerciseStat::NumRepsAvg,
    ExerciseStat::NumRepsTotal,
    ExerciseStat::NumPartialRepsMin,
    ExerciseStat::NumPartialRepsMax,
    ExerciseStat::NumPartialRepsAvg,
    ExerciseStat::NumPartialRepsTotal,
    ExerciseStat::NumRepsAndPartialRepsMin,
    ExerciseStat::NumRepsAndPartialRepsMax,
    ExerciseStat::NumRepsAndPartialRepsAvg,
    ExerciseStat::NumRepsAndPartialRepsTotal,
    ExerciseStat::DistanceMin,
    ExerciseStat::DistanceMax,
    ExerciseStat::DistanceAvg,
    ExerciseStat::DistanceTotal,
    ExerciseStat::TimeMin,
    ExerciseStat::TimeMax,
    ExerciseStat::TimeAvg,
    ExerciseStat::TimeTotal,
    ExerciseStat::SpeedMin,
    ExerciseStat::SpeedMax,
    ExerciseStat::SpeedAvg,
    ExerciseStat::PaceMin,
    ExerciseStat::PaceMax,
    ExerciseStat::PaceAvg,
    ExerciseStat::RirMin,
    ExerciseStat::RirMax,
    ExerciseStat::RirAvg,
    ExerciseStat::RpeMin,
    ExerciseStat::RpeMax,
    ExerciseStat::RpeAvg,
    ExerciseStat::ResistanceLevelMin,
    ExerciseStat::ResistanceLevelMax,
    ExerciseStat::ResistanceLevelAvg,
    ExerciseStat::SetBodyWeight,
];

impl ExerciseStat {
    /// Base name used in the string form of a chart key.
    pub fn name(self) -> &'static str {
        match self {
            ExerciseStat::WeightMin => "weight_min",
            ExerciseStat::WeightMax => "weight_max",
            ExerciseStat::WeightAvg => "weight_avg",
            ExerciseStat::WeightVolume => "weight_volume",
            ExerciseStat::NumSets => "num_sets",
            ExerciseStat::NumRepsMin => "num_reps_min",
            ExerciseStat::NumRepsMax => "num_reps_max",
            ExerciseStat::NumRepsAvg => "num_reps_avg",
            ExerciseStat::NumRepsTotal => "num_reps_total",
            ExerciseStat::NumPartialRepsMin => "num_partial_reps_min",
            ExerciseStat::NumPartialRepsMax => "num_partial_reps_max",
            ExerciseStat::NumPartialRepsAvg => "num_partial_reps_avg",
            ExerciseStat::NumPartialRepsTotal => "num_partial_reps_total",
            ExerciseStat::NumRepsAndPartialRepsMin => "num_reps_and_partial_reps_min",
            ExerciseStat::NumRepsAndPartialRepsMax => "num_reps_and_partial_reps_max",
            ExerciseStat::NumRepsAndPartialRepsAvg => "num_reps_and_partial_reps_avg",
            ExerciseStat::NumRepsAndPartialRepsTotal => "num_reps_and_partial_reps_total",
            ExerciseStat::DistanceMin => "distance_min",
            ExerciseStat::DistanceMax => "distance_max",
            ExerciseStat::DistanceAvg => "distance_avg",
            ExerciseStat::DistanceTotal => "distance_total",
            ExerciseStat::TimeMin => "time_min",
            ExerciseStat::TimeMax => "time_max",
            ExerciseStat::TimeAvg => "time_avg",
            ExerciseStat::TimeTotal => "time_total",
            ExerciseStat::SpeedMin => "speed_min",
            ExerciseStat::SpeedMax => "speed_max",
            ExerciseStat::SpeedAvg => "speed_avg",
            ExerciseStat::PaceMin => "pace_min",
            ExerciseStat::PaceMax => "pace_max",
            ExerciseStat::PaceAvg => "pace_avg",
            ExerciseStat::RirMin => "rir_min",
            ExerciseStat::RirMax => "rir_max",
            ExerciseStat::RirAvg => "rir_avg",
            ExerciseStat::RpeMin => "rpe_min",
            ExerciseStat::RpeMax => "rpe_max",
            ExerciseStat::RpeAvg => "rpe_avg",
            ExerciseStat::ResistanceLevelMin => "resistance_level_min",
            ExerciseStat::ResistanceLevelMax => "resistance_level_max",
            ExerciseStat::ResistanceLevelAvg => "resistance_level_avg",
            ExerciseStat::SetBodyWeight => "set_body_weight",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ALL_EXERCISE_STATS.iter().copied().find(|s| s.name() == name)
    }

    /// Human readable option label, e.g. "Max Weight".
    pub fn label(self) -> &'static str {
        match self {
            ExerciseStat::WeightMin => "Min Weight",
            ExerciseStat::WeightMax => "Max Weight",
            ExerciseStat::WeightAvg => "Average Weight",
            ExerciseStat::WeightVolume => "Volume",
            ExerciseStat::NumSets => "Number Of Sets",
            ExerciseStat::NumRepsMin => "Min Reps",
            ExerciseStat::NumRepsMax => "Max Reps",
            ExerciseStat::NumRepsAvg => "Average Reps",
            ExerciseStat::NumRepsTotal => "Total Reps",
            ExerciseStat::NumPartialRepsMin => "Min Partial Reps",
            ExerciseStat::NumPartialRepsMax => "Max Partial Reps",
            ExerciseStat::NumPartialRepsAvg => "Average Partial Reps",
            ExerciseStat::NumPartialRepsTotal => "Total Partial Reps",
            ExerciseStat::NumRepsAndPartialRepsMin => "Min Reps + Partial Reps",
            ExerciseStat::NumRepsAndPartialRepsMax => "Max Reps + Partial Reps",
            ExerciseStat::NumRepsAndPartialRepsAvg => "Average Reps + Partial Reps",
            ExerciseStat::NumRepsAndPartialRepsTotal => "Total Reps + Partial Reps",
            ExerciseStat::DistanceMin => "Min Distance",
            ExerciseStat::DistanceMax => "Max Distance",
            ExerciseStat::DistanceAvg => "Average Distance",
            ExerciseStat::DistanceTotal => "Total Distance",
            ExerciseStat::TimeMin => "Min Time",
            ExerciseStat::TimeMax => "Max Time",
            ExerciseStat::TimeAvg => "Average Time",
            ExerciseStat::TimeTotal => "Total Time",
            ExerciseStat::SpeedMin => "Min Speed",
            ExerciseStat::SpeedMax => "Max Speed",
            ExerciseStat::SpeedAvg => "Average Speed",
            ExerciseStat::PaceMin => "Min Pace",
            ExerciseStat::PaceMax => "Max Pace",
            ExerciseStat::PaceAvg => "Average Pace",
            ExerciseStat::RirMin => "Min RIR",
            ExerciseStat::RirMax => "Max RIR",
            ExerciseStat::RirAvg => "Average RIR",
            ExerciseStat::RpeMin => "Min RPE",
            ExerciseStat::RpeMax => "Max RPE",
            ExerciseStat::RpeAvg => "Average RPE",
            ExerciseStat::ResistanceLevelMin => "Min Resistance Level",
            ExerciseStat::ResistanceLevelMax => "Max Resistance Level",
            ExerciseStat::ResistanceLevelAvg => "Average Resistance Level",
            ExerciseStat::SetBodyWeight => "Body Weight",
        }
    }

    pub fn unit_category(self) -> UnitCategory {
        use ExerciseStat::*;
        match self {
            WeightMin | WeightMax | WeightAvg | WeightVolume | SetBodyWeight => UnitCategory::Weight,
            NumSets => UnitCategory::NumberOfSets,
            NumRepsMin | NumRepsMax | NumRepsAvg | NumRepsTotal => UnitCategory::NumberOfReps,
            NumPartialRepsMin | NumPartialRepsMax | NumPartialRepsAvg | NumPartialRepsTotal => {
                UnitCategory::NumberOfReps
            }
            NumRepsAndPartialRepsMin
            | NumRepsAndPartialRepsMax
            | NumRepsAndPartialRepsAvg
            | NumRepsAndPartialRepsTotal => UnitCategory::NumberOfReps,
            DistanceMin | DistanceMax | DistanceAvg | DistanceTotal => UnitCategory::Distance,
            TimeMin | TimeMax | TimeAvg | TimeTotal => UnitCategory::Time,
            SpeedMin | SpeedMax | SpeedAvg => UnitCategory::Speed,
            PaceMin | PaceMax | PaceAvg => UnitCategory::Pace,
            RirMin | RirMax | RirAvg => UnitCategory::Rir,
            RpeMin | RpeMax | RpeAvg => UnitCategory::Rpe,
            ResistanceLevelMin | ResistanceLevelMax | ResistanceLevelAvg => {
                UnitCategory::ResistanceLevel
            }
        }
    }
}

/// Group of series sharing a physical unit; decides axis compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitCategory {
    Calories,
    Macros,
    Weight,
    #[serde(rename = "Body Fat %")]
    BodyFat,
    Caliper,
    Circumference,
    #[serde(rename = "Number Of Sets")]
    NumberOfSets,
    #[serde(rename = "Number Of Reps")]
    NumberOfReps,
    Distance,
    Time,
    Speed,
    Pace,
    #[serde(rename = "RIR")]
    Rir,
    #[serde(rename = "RPE")]
    Rpe,
    #[serde(rename = "Resistance Level")]
    ResistanceLevel,
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitCategory::Calories => "Calories",
            UnitCategory::Macros => "Macros",
            UnitCategory::Weight => "Weight",
            UnitCategory::BodyFat => "Body Fat %",
            UnitCategory::Caliper => "Caliper",
            UnitCategory::Circumference => "Circumference",
            UnitCategory::NumberOfSets => "Number Of Sets",
            UnitCategory::NumberOfReps => "Number Of Reps",
            UnitCategory::Distance => "Distance",
            UnitCategory::Time => "Time",
            UnitCategory::Speed => "Speed",
            UnitCategory::Pace => "Pace",
            UnitCategory::Rir => "RIR",
            UnitCategory::Rpe => "RPE",
            UnitCategory::ResistanceLevel => "Resistance Level",
        };
        f.write_str(s)
    }
}

/// What "nothing observed yet" means for a category's running maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelFamily {
    /// Body and diet readings; a maximum of `0` means no observation.
    Continuous,
    /// Exercise stats and macros; `-1` means no observation, `0` is a real value.
    Count,
}

impl SentinelFamily {
    pub fn sentinel(self) -> f64 {
        match self {
            SentinelFamily::Continuous => 0.0,
            SentinelFamily::Count => -1.0,
        }
    }
}

/// One measurable series on the chart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryKey {
    Calories,
    Fat,
    Carbs,
    Protein,
    BodyWeight,
    BodyFatPercentage,
    Measurement(i64),
    Exercise { stat: ExerciseStat, exercise_id: i64 },
    ExerciseGroup(String),
}

impl CategoryKey {
    pub fn calories() -> Self {
        CategoryKey::Calories
    }

    pub fn fat() -> Self {
        CategoryKey::Fat
    }

    pub fn exercise(stat: ExerciseStat, exercise_id: i64) -> Self {
        CategoryKey::Exercise { stat, exercise_id }
    }

    /// Key for the set count of one exercise group tag.
    ///
    /// Panics if `tag` is empty or contains an underscore, since the string
    /// form could then no longer be split back at its last underscore.
    pub fn exercise_group(tag: &str) -> Self {
        assert!(
            !tag.is_empty() && !tag.contains('_'),
            "malformed composite key: exercise_group_{tag}"
        );
        CategoryKey::ExerciseGroup(tag.to_string())
    }

    /// The four categories backed by one diet-log row.
    pub fn diet_log_keys() -> [CategoryKey; 4] {
        [
            CategoryKey::Calories,
            CategoryKey::Fat,
            CategoryKey::Carbs,
            CategoryKey::Protein,
        ]
    }

    /// Owning entity id for composite keys.
    pub fn owner_id(&self) -> Option<i64> {
        match self {
            CategoryKey::Measurement(id) => Some(*id),
            CategoryKey::Exercise { exercise_id, .. } => Some(*exercise_id),
            _ => None,
        }
    }

    pub fn unit_category(&self) -> UnitCategory {
        match self {
            CategoryKey::Calories => UnitCategory::Calories,
            CategoryKey::Fat | CategoryKey::Carbs | CategoryKey::Protein => UnitCategory::Macros,
            CategoryKey::BodyWeight => UnitCategory::Weight,
            CategoryKey::BodyFatPercentage => UnitCategory::BodyFat,
            // Caliper measurements override this when loaded.
            CategoryKey::Measurement(_) => UnitCategory::Circumference,
            CategoryKey::Exercise { stat, .. } => stat.unit_category(),
            CategoryKey::ExerciseGroup(_) => UnitCategory::NumberOfSets,
        }
    }

    pub fn family(&self) -> SentinelFamily {
        match self {
            CategoryKey::Fat
            | CategoryKey::Carbs
            | CategoryKey::Protein
            | CategoryKey::Exercise { .. } => SentinelFamily::Count,
            _ => SentinelFamily::Continuous,
        }
    }

    /// Label used before a load supplies a more specific one.
    pub fn default_label(&self) -> String {
        match self {
            CategoryKey::Calories => "Calories".into(),
            CategoryKey::Fat => "Fat".into(),
            CategoryKey::Carbs => "Carbs".into(),
            CategoryKey::Protein => "Protein".into(),
            CategoryKey::BodyWeight => "Body Weight".into(),
            CategoryKey::BodyFatPercentage => "Body Fat %".into(),
            CategoryKey::Measurement(id) => format!("Measurement {id}"),
            CategoryKey::Exercise { stat, .. } => stat.label().into(),
            CategoryKey::ExerciseGroup(tag) => format!("Number Of {tag} Sets"),
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKey::Calories => f.write_str("calories"),
            CategoryKey::Fat => f.write_str("fat"),
            CategoryKey::Carbs => f.write_str("carbs"),
            CategoryKey::Protein => f.write_str("protein"),
            CategoryKey::BodyWeight => f.write_str("body_weight"),
            CategoryKey::BodyFatPercentage => f.write_str("body_fat_percentage"),
            CategoryKey::Measurement(id) => write!(f, "measurement_{id}"),
            CategoryKey::Exercise { stat, exercise_id } => {
                write!(f, "{}_{exercise_id}", stat.name())
            }
            CategoryKey::ExerciseGroup(tag) => write!(f, "exercise_group_{tag}"),
        }
    }
}

impl FromStr for CategoryKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calories" => return Ok(CategoryKey::Calories),
            "fat" => return Ok(CategoryKey::Fat),
            "carbs" => return Ok(CategoryKey::Carbs),
            "protein" => return Ok(CategoryKey::Protein),
            "body_weight" => return Ok(CategoryKey::BodyWeight),
            "body_fat_percentage" => return Ok(CategoryKey::BodyFatPercentage),
            _ => {}
        }

        let Some((base, owner)) = s.rsplit_once('_') else {
            return Err(KeyError::UnknownStat(s.to_string()));
        };
        if base.is_empty() || owner.is_empty() {
            return Err(KeyError::MalformedCompositeKey(s.to_string()));
        }

        if base == "exercise_group" {
            return Ok(CategoryKey::ExerciseGroup(owner.to_string()));
        }

        let id: i64 = owner
            .parse()
            .map_err(|_| KeyError::MalformedCompositeKey(s.to_string()))?;

        if base == "measurement" {
            return Ok(CategoryKey::Measurement(id));
        }

        ExerciseStat::from_name(base)
            .map(|stat| CategoryKey::Exercise {
                stat,
                exercise_id: id,
            })
            .ok_or_else(|| KeyError::UnknownStat(s.to_string()))
    }
}

impl Serialize for CategoryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CategoryKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Display information attached to a loaded series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    pub label: String,
    pub unit: String,
    pub unit_category: UnitCategory,
}
