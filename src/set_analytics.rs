// Per-date statistics over the completed sets of one exercise
use std::collections::{BTreeMap, BTreeSet};

use crate::category::ExerciseStat;
use crate::chart_data::round_two_decimals;
use crate::sources::CompletedSet;
use crate::units::{DistanceUnit, PaceUnit, SpeedUnit, UnitConverter, WeightUnit};

/// Target units and filters applied while aggregating sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetAnalyticsOptions {
    pub weight_unit: WeightUnit,
    pub distance_unit: DistanceUnit,
    pub speed_unit: SpeedUnit,
    pub pace_unit: PaceUnit,
    pub ignore_warmups: bool,
    pub ignore_multisets: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    min: Option<f64>,
    max: Option<f64>,
    total: f64,
    count: u32,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self.total += value;
        self.count += 1;
    }

    fn total(&self) -> Option<f64> {
        (self.count > 0).then_some(self.total)
    }

    fn avg(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

/// Result of aggregating one day's sets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetListAnalytics {
    /// Only stats that had at least one tracked value.
    pub values: BTreeMap<ExerciseStat, f64>,
    /// 1-based set number to comment.
    pub set_comments: Vec<(usize, String)>,
    /// Workout id to workout comment, one per workout.
    pub workout_comments: BTreeMap<i64, String>,
    pub includes_multiset: bool,
}

/// Compute the requested stats for the sets of a single day.
pub fn analyze_set_list(
    sets: &[CompletedSet],
    stats: &BTreeSet<ExerciseStat>,
    options: &SetAnalyticsOptions,
    units: &impl UnitConverter,
) -> SetListAnalytics {
    let mut weight = Accumulator::default();
    let mut volume: Option<f64> = None;
    let mut reps = Accumulator::default();
    let mut partial_reps = Accumulator::default();
    let mut reps_and_partial_reps = Accumulator::default();
    let mut distance = Accumulator::default();
    let mut time = Accumulator::default();
    let mut speed = Accumulator::default();
    let mut pace = Accumulator::default();
    let mut rir = Accumulator::default();
    let mut rpe = Accumulator::default();
    let mut resistance_level = Accumulator::default();
    let mut body_weight: Option<f64> = None;
    let mut num_sets = 0u32;

    let mut out = SetListAnalytics::default();

    for (index, set) in sets.iter().enumerate() {
        if options.ignore_warmups && set.is_warmup {
            continue;
        }
        if options.ignore_multisets && set.multiset_id > 0 {
            continue;
        }
        num_sets += 1;

        if set.is_tracking_weight {
            let w = units.convert(set.weight, set.weight_unit.into(), options.weight_unit.into());
            weight.add(w);
            if set.is_tracking_reps {
                *volume.get_or_insert(0.0) += w * set.reps;
            }
        }

        if set.is_tracking_distance {
            let d = units.convert(
                set.distance,
                set.distance_unit.into(),
                options.distance_unit.into(),
            );
            distance.add(d);
            let meters = units.convert(set.distance, set.distance_unit.into(), DistanceUnit::M.into());
            if set.is_tracking_time && set.time_in_seconds > 0.0 {
                let kmh = (meters / 1000.0) / (set.time_in_seconds / 3600.0);
                speed.add(units.convert(kmh, SpeedUnit::KmH.into(), options.speed_unit.into()));
            }
            if set.is_tracking_time && meters > 0.0 {
                let seconds_per_meter = set.time_in_seconds / meters;
                pace.add(units.convert(
                    seconds_per_meter,
                    PaceUnit::SecPerM.into(),
                    options.pace_unit.into(),
                ));
            }
        }

        if set.is_tracking_time {
            time.add(set.time_in_seconds / 60.0);
        }
        if set.is_tracking_reps {
            reps.add(set.reps);
        }
        if set.is_tracking_partial_reps {
            partial_reps.add(set.partial_reps);
            if set.is_tracking_reps {
                reps_and_partial_reps.add(set.reps + set.partial_reps);
            }
        }
        if set.is_tracking_rir {
            rir.add(set.rir);
        }
        if set.is_tracking_rpe {
            rpe.add(set.rpe);
        }
        if set.is_tracking_resistance_level {
            resistance_level.add(set.resistance_level);
        }

        // First recorded body weight of the day wins.
        if set.is_tracking_user_weight && body_weight.is_none() {
            body_weight = Some(units.convert(
                set.user_weight,
                set.user_weight_unit.into(),
                options.weight_unit.into(),
            ));
        }

        if let Some(comment) = &set.comment {
            out.set_comments.push((index + 1, comment.clone()));
        }
        if set.multiset_id > 0 {
            out.includes_multiset = true;
        }
        if let Some(comment) = &set.workout_comment {
            out.workout_comments.insert(set.workout_id, comment.clone());
        }
    }

    for stat in stats {
        use ExerciseStat::*;
        let value = match stat {
            WeightMin => weight.min,
            WeightMax => weight.max,
            WeightAvg => weight.avg(),
            WeightVolume => volume,
            NumSets => (num_sets > 0).then_some(num_sets as f64),
            NumRepsMin => reps.min,
            NumRepsMax => reps.max,
            NumRepsAvg => reps.avg(),
            NumRepsTotal => reps.total(),
            NumPartialRepsMin => partial_reps.min,
            NumPartialRepsMax => partial_reps.max,
            NumPartialRepsAvg => partial_reps.avg(),
            NumPartialRepsTotal => partial_reps.total(),
            NumRepsAndPartialRepsMin => reps_and_partial_reps.min,
            NumRepsAndPartialRepsMax => reps_and_partial_reps.max,
            NumRepsAndPartialRepsAvg => reps_and_partial_reps.avg(),
            NumRepsAndPartialRepsTotal => reps_and_partial_reps.total(),
            DistanceMin => distance.min,
            DistanceMax => distance.max,
            DistanceAvg => distance.avg(),
            DistanceTotal => distance.total(),
            TimeMin => time.min,
            TimeMax => time.max,
            TimeAvg => time.avg(),
            TimeTotal => time.total(),
            SpeedMin => speed.min,
            SpeedMax => speed.max,
            SpeedAvg => speed.avg(),
            PaceMin => pace.min,
            PaceMax => pace.max,
            PaceAvg => pace.avg(),
            RirMin => rir.min,
            RirMax => rir.max,
            RirAvg => rir.avg(),
            RpeMin => rpe.min,
            RpeMax => rpe.max,
            RpeAvg => rpe.avg(),
            ResistanceLevelMin => resistance_level.min,
            ResistanceLevelMax => resistance_level.max,
            ResistanceLevelAvg => resistance_level.avg(),
            SetBodyWeight => body_weight,
        };
        if let Some(v) = value {
            out.values.insert(*stat, round_two_decimals(v));
        }
    }

    out
}

/// Unit suffix shown next to values of a stat.
pub fn stat_unit(stat: ExerciseStat, options: &SetAnalyticsOptions) -> String {
    use crate::category::UnitCategory;
    match stat.unit_category() {
        UnitCategory::Weight => options.weight_unit.to_string(),
        UnitCategory::Distance => options.distance_unit.to_string(),
        UnitCategory::Time => "min".into(),
        UnitCategory::Speed => options.speed_unit.to_string(),
        UnitCategory::Pace => options.pace_unit.to_string(),
        UnitCategory::NumberOfSets => "sets".into(),
        UnitCategory::NumberOfReps => "reps".into(),
        UnitCategory::Rir => "RIR".into(),
        UnitCategory::Rpe => "RPE".into(),
        UnitCategory::ResistanceLevel => "RL".into(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::StandardUnits;

    fn weighted(weight: f64, unit: WeightUnit, reps: f64) -> CompletedSet {
        CompletedSet {
            is_tracking_weight: true,
            weight,
            weight_unit: unit,
            is_tracking_reps: true,
            reps,
            ..Default::default()
        }
    }

    fn all_weight_stats() -> BTreeSet<ExerciseStat> {
        BTreeSet::from([
            ExerciseStat::WeightMin,
            ExerciseStat::WeightMax,
            ExerciseStat::WeightAvg,
            ExerciseStat::WeightVolume,
            ExerciseStat::NumSets,
            ExerciseStat::NumRepsTotal,
        ])
    }

    #[test]
    fn weight_stats_for_a_day() {
        let sets = vec![weighted(100.0, WeightUnit::Kg, 5.0), weighted(80.0, WeightUnit::Kg, 8.0)];
        let a = analyze_set_list(
            &sets,
            &all_weight_stats(),
            &SetAnalyticsOptions::default(),
            &StandardUnits,
        );
        assert_eq!(a.values[&ExerciseStat::WeightMin], 80.0);
        assert_eq!(a.values[&ExerciseStat::WeightMax], 100.0);
        assert_eq!(a.values[&ExerciseStat::WeightAvg], 90.0);
        assert_eq!(a.values[&ExerciseStat::WeightVolume], 1140.0);
        assert_eq!(a.values[&ExerciseStat::NumSets], 2.0);
        assert_eq!(a.values[&ExerciseStat::NumRepsTotal], 13.0);
    }

    #[test]
    fn weights_are_converted_to_target_unit() {
        let sets = vec![weighted(225.0, WeightUnit::Lbs, 1.0)];
        let stats = BTreeSet::from([ExerciseStat::WeightMax]);
        let a = analyze_set_list(&sets, &stats, &SetAnalyticsOptions::default(), &StandardUnits);
        assert_eq!(a.values[&ExerciseStat::WeightMax], 102.06);
    }

    #[test]
    fn untracked_stats_are_absent() {
        let sets = vec![weighted(100.0, WeightUnit::Kg, 5.0)];
        let stats = BTreeSet::from([ExerciseStat::DistanceMax, ExerciseStat::RirAvg]);
        let a = analyze_set_list(&sets, &stats, &SetAnalyticsOptions::default(), &StandardUnits);
        assert!(a.values.is_empty());
    }

    #[test]
    fn zero_rir_is_a_value() {
        let set = CompletedSet {
            is_tracking_rir: true,
            rir: 0.0,
            ..Default::default()
        };
        let stats = BTreeSet::from([ExerciseStat::RirMax]);
        let a = analyze_set_list(&[set], &stats, &SetAnalyticsOptions::default(), &StandardUnits);
        assert_eq!(a.values.get(&ExerciseStat::RirMax), Some(&0.0));
    }

    #[test]
    fn warmups_and_multisets_can_be_ignored() {
        let mut warmup = weighted(60.0, WeightUnit::Kg, 10.0);
        warmup.is_warmup = true;
        let mut superset = weighted(120.0, WeightUnit::Kg, 3.0);
        superset.multiset_id = 4;
        let sets = vec![warmup, weighted(100.0, WeightUnit::Kg, 5.0), superset];

        let options = SetAnalyticsOptions {
            ignore_warmups: true,
            ignore_multisets: true,
            ..Default::default()
        };
        let a = analyze_set_list(&sets, &all_weight_stats(), &options, &StandardUnits);
        assert_eq!(a.values[&ExerciseStat::WeightMin], 100.0);
        assert_eq!(a.values[&ExerciseStat::WeightMax], 100.0);
        assert_eq!(a.values[&ExerciseStat::NumSets], 1.0);
        assert!(!a.includes_multiset);

        let a = analyze_set_list(
            &sets,
            &all_weight_stats(),
            &SetAnalyticsOptions::default(),
            &StandardUnits,
        );
        assert!(a.includes_multiset);
        assert_eq!(a.values[&ExerciseStat::NumSets], 3.0);
    }

    #[test]
    fn speed_from_distance_and_time() {
        let run = CompletedSet {
            is_tracking_distance: true,
            distance: 5.0,
            distance_unit: DistanceUnit::Km,
            is_tracking_time: true,
            time_in_seconds: 1800.0,
            ..Default::default()
        };
        let stats = BTreeSet::from([ExerciseStat::SpeedMax, ExerciseStat::TimeTotal]);
        let a = analyze_set_list(&[run], &stats, &SetAnalyticsOptions::default(), &StandardUnits);
        assert_eq!(a.values[&ExerciseStat::SpeedMax], 10.0);
        assert_eq!(a.values[&ExerciseStat::TimeTotal], 30.0);
    }

    #[test]
    fn comments_are_collected() {
        let mut first = weighted(100.0, WeightUnit::Kg, 5.0);
        first.workout_id = 3;
        first.workout_comment = Some("felt strong".into());
        let mut second = weighted(100.0, WeightUnit::Kg, 5.0);
        second.workout_id = 3;
        second.workout_comment = Some("felt strong".into());
        second.comment = Some("grindy".into());

        let a = analyze_set_list(
            &[first, second],
            &BTreeSet::from([ExerciseStat::WeightMax]),
            &SetAnalyticsOptions::default(),
            &StandardUnits,
        );
        assert_eq!(a.set_comments, vec![(2, "grindy".to_string())]);
        assert_eq!(a.workout_comments.len(), 1);
    }

    #[test]
    fn first_body_weight_wins() {
        let bw = |w: f64| CompletedSet {
            is_tracking_user_weight: true,
            user_weight: w,
            user_weight_unit: WeightUnit::Kg,
            ..Default::default()
        };
        let a = analyze_set_list(
            &[bw(81.0), bw(82.0)],
            &BTreeSet::from([ExerciseStat::SetBodyWeight]),
            &SetAnalyticsOptions::default(),
            &StandardUnits,
        );
        assert_eq!(a.values[&ExerciseStat::SetBodyWeight], 81.0);
    }

    #[test]
    fn pace_is_time_per_distance() {
        let run = |distance: f64, seconds: f64| CompletedSet {
            is_tracking_distance: true,
            distance,
            distance_unit: DistanceUnit::Km,
            is_tracking_time: true,
            time_in_seconds: seconds,
            ..Default::default()
        };
        let stats = BTreeSet::from([
            ExerciseStat::PaceMin,
            ExerciseStat::PaceMax,
            ExerciseStat::PaceAvg,
        ]);
        let sets = [run(5.0, 1500.0), run(2.0, 720.0)];
        let a = analyze_set_list(&sets, &stats, &SetAnalyticsOptions::default(), &StandardUnits);
        assert_eq!(a.values[&ExerciseStat::PaceMin], 5.0);
        assert_eq!(a.values[&ExerciseStat::PaceMax], 6.0);
        assert_eq!(a.values[&ExerciseStat::PaceAvg], 5.5);

        let options = SetAnalyticsOptions {
            pace_unit: PaceUnit::SecPerM,
            ..Default::default()
        };
        let a = analyze_set_list(&sets[..1], &stats, &options, &StandardUnits);
        assert_eq!(a.values[&ExerciseStat::PaceMax], 0.3);
        assert_eq!(stat_unit(ExerciseStat::PaceMax, &options), "s/m");
    }

    #[test]
    fn zero_distance_has_no_pace() {
        let set = CompletedSet {
            is_tracking_distance: true,
            is_tracking_time: true,
            time_in_seconds: 60.0,
            ..Default::default()
        };
        let stats = BTreeSet::from([ExerciseStat::PaceMax, ExerciseStat::DistanceMax]);
        let a = analyze_set_list(&[set], &stats, &SetAnalyticsOptions::default(), &StandardUnits);
        assert_eq!(a.values.get(&ExerciseStat::PaceMax), None);
        assert_eq!(a.values.get(&ExerciseStat::DistanceMax), Some(&0.0));
    }

    #[test]
    fn partial_reps_and_their_sum_with_reps() {
        let set = |reps: f64, partial: Option<f64>| CompletedSet {
            is_tracking_reps: true,
            reps,
            is_tracking_partial_reps: partial.is_some(),
            partial_reps: partial.unwrap_or_default(),
            ..Default::default()
        };
        let stats = BTreeSet::from([
            ExerciseStat::NumPartialRepsMin,
            ExerciseStat::NumPartialRepsMax,
            ExerciseStat::NumPartialRepsAvg,
            ExerciseStat::NumPartialRepsTotal,
            ExerciseStat::NumRepsAndPartialRepsMin,
            ExerciseStat::NumRepsAndPartialRepsMax,
            ExerciseStat::NumRepsAndPartialRepsAvg,
            ExerciseStat::NumRepsAndPartialRepsTotal,
        ]);
        let sets = [set(8.0, Some(2.0)), set(6.0, Some(3.0)), set(12.0, None)];
        let a = analyze_set_list(&sets, &stats, &SetAnalyticsOptions::default(), &StandardUnits);
        assert_eq!(a.values[&ExerciseStat::NumPartialRepsMin], 2.0);
        assert_eq!(a.values[&ExerciseStat::NumPartialRepsMax], 3.0);
        assert_eq!(a.values[&ExerciseStat::NumPartialRepsAvg], 2.5);
        assert_eq!(a.values[&ExerciseStat::NumPartialRepsTotal], 5.0);
        assert_eq!(a.values[&ExerciseStat::NumRepsAndPartialRepsMin], 9.0);
        assert_eq!(a.values[&ExerciseStat::NumRepsAndPartialRepsMax], 10.0);
        assert_eq!(a.values[&ExerciseStat::NumRepsAndPartialRepsAvg], 9.5);
        assert_eq!(a.values[&ExerciseStat::NumRepsAndPartialRepsTotal], 19.0);
        assert_eq!(
            stat_unit(ExerciseStat::NumPartialRepsTotal, &SetAnalyticsOptions::default()),
            "reps"
        );
    }

    #[test]
    fn resistance_level_stats() {
        let set = |level: f64| CompletedSet {
            is_tracking_resistance_level: true,
            resistance_level: level,
            ..Default::default()
        };
        let stats = BTreeSet::from([
            ExerciseStat::ResistanceLevelMin,
            ExerciseStat::ResistanceLevelMax,
            ExerciseStat::ResistanceLevelAvg,
        ]);
        let a = analyze_set_list(
            &[set(8.0), set(10.0)],
            &stats,
            &SetAnalyticsOptions::default(),
            &StandardUnits,
        );
        assert_eq!(a.values[&ExerciseStat::ResistanceLevelMin], 8.0);
        assert_eq!(a.values[&ExerciseStat::ResistanceLevelMax], 10.0);
        assert_eq!(a.values[&ExerciseStat::ResistanceLevelAvg], 9.0);
        assert_eq!(
            stat_unit(ExerciseStat::ResistanceLevelAvg, &SetAnalyticsOptions::default()),
            "RL"
        );
    }
}
