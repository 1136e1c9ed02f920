//! Chart-data aggregation for workout, diet and body tracking records.

pub mod annotations;
pub mod axis;
pub mod category;
pub mod chart_data;
pub mod date_key;
pub mod error;
pub mod exercise_groups;
pub mod export;
pub mod load_registry;
pub mod max_values;
pub mod reference_areas;
pub mod session;
pub mod set_analytics;
pub mod settings;
pub mod sources;
pub mod units;

pub use category::{CategoryKey, ExerciseStat, SeriesMetadata, UnitCategory};
pub use chart_data::ChartRow;
pub use error::{KeyError, LoadError, SourceKind};
pub use session::{AnalyticsSession, ChartView, DietMetric, LoadOutcome, LoadRequest};
pub use settings::AnalyticsSettings;
pub use sources::{InMemorySource, RecordSource};
pub use units::{
    DisplayUnit, DistanceUnit, LengthUnit, PaceUnit, SpeedUnit, StandardUnits, UnitConverter,
    WeightUnit,
};
