// Display units and conversions between units of one family
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::category::UnitCategory;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightUnit {
    #[default]
    #[serde(rename = "kg")]
    Kg,
    #[serde(rename = "lbs", alias = "lb")]
    Lbs,
}

impl WeightUnit {
    pub const ALL: [WeightUnit; 2] = [WeightUnit::Kg, WeightUnit::Lbs];

    pub fn as_str(self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }

    /// Kilograms per unit.
    fn factor(self) -> f64 {
        match self {
            WeightUnit::Kg => 1.0,
            WeightUnit::Lbs => 0.453_592_37,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    #[serde(rename = "km")]
    Km,
    #[serde(rename = "m")]
    M,
    #[serde(rename = "mi")]
    Mi,
    #[serde(rename = "yd")]
    Yd,
    #[serde(rename = "ft")]
    Ft,
}

impl DistanceUnit {
    pub const ALL: [DistanceUnit; 5] = [
        DistanceUnit::Km,
        DistanceUnit::M,
        DistanceUnit::Mi,
        DistanceUnit::Yd,
        DistanceUnit::Ft,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DistanceUnit::Km => "km",
            DistanceUnit::M => "m",
            DistanceUnit::Mi => "mi",
            DistanceUnit::Yd => "yd",
            DistanceUnit::Ft => "ft",
        }
    }

    /// Meters per unit.
    fn factor(self) -> f64 {
        match self {
            DistanceUnit::Km => 1000.0,
            DistanceUnit::M => 1.0,
            DistanceUnit::Mi => 1609.344,
            DistanceUnit::Yd => 0.9144,
            DistanceUnit::Ft => 0.3048,
        }
    }

    fn is_imperial(self) -> bool {
        matches!(self, DistanceUnit::Mi | DistanceUnit::Yd | DistanceUnit::Ft)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedUnit {
    #[default]
    #[serde(rename = "km/h")]
    KmH,
    #[serde(rename = "mph")]
    Mph,
}

impl SpeedUnit {
    pub const ALL: [SpeedUnit; 2] = [SpeedUnit::KmH, SpeedUnit::Mph];

    pub fn as_str(self) -> &'static str {
        match self {
            SpeedUnit::KmH => "km/h",
            SpeedUnit::Mph => "mph",
        }
    }

    /// Kilometers per hour per unit.
    fn factor(self) -> f64 {
        match self {
            SpeedUnit::KmH => 1.0,
            SpeedUnit::Mph => 1.609_344,
        }
    }

    pub fn for_distance(distance: DistanceUnit) -> Self {
        if distance.is_imperial() {
            SpeedUnit::Mph
        } else {
            SpeedUnit::KmH
        }
    }
}

/// Time per distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaceUnit {
    #[default]
    #[serde(rename = "min/km")]
    MinPerKm,
    #[serde(rename = "s/m")]
    SecPerM,
    #[serde(rename = "min/mi")]
    MinPerMi,
    #[serde(rename = "s/yd")]
    SecPerYd,
}

impl PaceUnit {
    pub const ALL: [PaceUnit; 4] = [
        PaceUnit::MinPerKm,
        PaceUnit::SecPerM,
        PaceUnit::MinPerMi,
        PaceUnit::SecPerYd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaceUnit::MinPerKm => "min/km",
            PaceUnit::SecPerM => "s/m",
            PaceUnit::MinPerMi => "min/mi",
            PaceUnit::SecPerYd => "s/yd",
        }
    }

    /// Seconds per meter per unit.
    fn factor(self) -> f64 {
        match self {
            PaceUnit::MinPerKm => 60.0 / 1000.0,
            PaceUnit::SecPerM => 1.0,
            PaceUnit::MinPerMi => 60.0 / 1609.344,
            PaceUnit::SecPerYd => 1.0 / 0.9144,
        }
    }

    pub fn for_distance(distance: DistanceUnit) -> Self {
        if distance.is_imperial() {
            PaceUnit::MinPerMi
        } else {
            PaceUnit::MinPerKm
        }
    }
}

/// Body measurement lengths. Calipers always read millimeters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    #[serde(rename = "cm")]
    Cm,
    #[serde(rename = "mm")]
    Mm,
    #[serde(rename = "in")]
    In,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 3] = [LengthUnit::Cm, LengthUnit::Mm, LengthUnit::In];

    pub fn as_str(self) -> &'static str {
        match self {
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
            LengthUnit::In => "in",
        }
    }

    /// Centimeters per unit.
    fn factor(self) -> f64 {
        match self {
            LengthUnit::Cm => 1.0,
            LengthUnit::Mm => 0.1,
            LengthUnit::In => 2.54,
        }
    }
}

/// Error for a unit string outside the expected family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownUnit(pub String);

impl fmt::Display for UnknownUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown unit: {}", self.0)
    }
}

impl std::error::Error for UnknownUnit {}

macro_rules! unit_str_impls {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownUnit;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|u| u.as_str() == s)
                    .ok_or_else(|| UnknownUnit(s.to_string()))
            }
        }
    )*};
}

unit_str_impls!(WeightUnit, DistanceUnit, SpeedUnit, PaceUnit, LengthUnit);

/// A unit any convertible series can be displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayUnit {
    Weight(WeightUnit),
    Distance(DistanceUnit),
    Speed(SpeedUnit),
    Pace(PaceUnit),
    Circumference(LengthUnit),
}

impl DisplayUnit {
    /// Parse `unit` as a unit of `category`. Categories without a unit
    /// choice yield `None`.
    pub fn parse(category: UnitCategory, unit: &str) -> Option<Self> {
        match category {
            UnitCategory::Weight => unit.parse().ok().map(DisplayUnit::Weight),
            UnitCategory::Distance => unit.parse().ok().map(DisplayUnit::Distance),
            UnitCategory::Speed => unit.parse().ok().map(DisplayUnit::Speed),
            UnitCategory::Pace => unit.parse().ok().map(DisplayUnit::Pace),
            UnitCategory::Circumference => unit.parse().ok().map(DisplayUnit::Circumference),
            _ => None,
        }
    }

    pub fn unit_category(self) -> UnitCategory {
        match self {
            DisplayUnit::Weight(_) => UnitCategory::Weight,
            DisplayUnit::Distance(_) => UnitCategory::Distance,
            DisplayUnit::Speed(_) => UnitCategory::Speed,
            DisplayUnit::Pace(_) => UnitCategory::Pace,
            DisplayUnit::Circumference(_) => UnitCategory::Circumference,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayUnit::Weight(u) => u.as_str(),
            DisplayUnit::Distance(u) => u.as_str(),
            DisplayUnit::Speed(u) => u.as_str(),
            DisplayUnit::Pace(u) => u.as_str(),
            DisplayUnit::Circumference(u) => u.as_str(),
        }
    }

    fn factor(self) -> f64 {
        match self {
            DisplayUnit::Weight(u) => u.factor(),
            DisplayUnit::Distance(u) => u.factor(),
            DisplayUnit::Speed(u) => u.factor(),
            DisplayUnit::Pace(u) => u.factor(),
            DisplayUnit::Circumference(u) => u.factor(),
        }
    }
}

impl fmt::Display for DisplayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<WeightUnit> for DisplayUnit {
    fn from(u: WeightUnit) -> Self {
        DisplayUnit::Weight(u)
    }
}

impl From<DistanceUnit> for DisplayUnit {
    fn from(u: DistanceUnit) -> Self {
        DisplayUnit::Distance(u)
    }
}

impl From<SpeedUnit> for DisplayUnit {
    fn from(u: SpeedUnit) -> Self {
        DisplayUnit::Speed(u)
    }
}

impl From<PaceUnit> for DisplayUnit {
    fn from(u: PaceUnit) -> Self {
        DisplayUnit::Pace(u)
    }
}

impl From<LengthUnit> for DisplayUnit {
    fn from(u: LengthUnit) -> Self {
        DisplayUnit::Circumference(u)
    }
}

/// Converts a value between two units of the same family.
pub trait UnitConverter {
    fn convert(&self, value: f64, from: DisplayUnit, to: DisplayUnit) -> f64;
}

/// Fixed conversion factors for every supported unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardUnits;

impl UnitConverter for StandardUnits {
    fn convert(&self, value: f64, from: DisplayUnit, to: DisplayUnit) -> f64 {
        if from == to {
            return value;
        }
        if from.unit_category() != to.unit_category() {
            log::warn!("Cannot convert from {from} to {to}, keeping value");
            return value;
        }
        value * from.factor() / to.factor()
    }
}
