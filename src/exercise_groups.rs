use chrono::NaiveDate;
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::category::CategoryKey;
use crate::chart_data::{ChartRow, round_two_decimals};
use crate::date_key::DateKeyFormatter;

/// Known muscle group tags and their display names.
pub static EXERCISE_GROUPS: phf::Map<&'static str, &'static str> = phf_map! {
    "chest" => "Chest",
    "triceps" => "Triceps",
    "biceps" => "Biceps",
    "forearms" => "Forearms",
    "shoulders" => "Shoulders",
    "upper-back" => "Upper Back",
    "lats" => "Mid Back (Lats)",
    "lower-back" => "Lower Back",
    "glutes" => "Glutes",
    "adductors" => "Adductors",
    "quadriceps" => "Quadriceps",
    "hamstrings" => "Hamstrings",
    "calves" => "Calves",
    "core" => "Core (Abs)",
    "grip" => "Grip",
    "neck" => "Neck",
    "cardio" => "Cardio",
    "other" => "Other",
};

/// Display name for a group tag, falling back to the tag itself.
pub fn group_display_name(tag: &str) -> &str {
    EXERCISE_GROUPS.get(tag).copied().unwrap_or(tag)
}

/// Parse a comma separated primary group string such as `"chest,triceps"`.
/// Unknown tags are skipped.
pub fn parse_primary_groups(s: &str) -> BTreeSet<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| EXERCISE_GROUPS.contains_key(*t))
        .map(str::to_string)
        .collect()
}

/// Parse a secondary group string such as `"tricepsx0.5,shouldersx0.25"`.
///
/// Entries with an unknown tag or a multiplier outside `(0, 1]` are skipped.
pub fn parse_secondary_groups(s: &str) -> BTreeMap<String, f64> {
    let mut map = BTreeMap::new();
    for part in s.split(',') {
        let Some((tag, multiplier)) = part.trim().rsplit_once('x') else {
            continue;
        };
        if !EXERCISE_GROUPS.contains_key(tag) {
            continue;
        }
        match multiplier.parse::<f64>() {
            Ok(m) if m > 0.0 && m <= 1.0 => {
                map.insert(tag.to_string(), m);
            }
            _ => {}
        }
    }
    map
}

/// Group membership of one exercise.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExerciseGroupMembership {
    pub exercise_id: i64,
    #[serde(default)]
    pub primary: BTreeSet<String>,
    #[serde(default)]
    pub secondary: Option<BTreeMap<String, f64>>,
}

/// Which groups to count and how secondary movers are credited.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupSelection {
    pub groups: Vec<String>,
    #[serde(default)]
    pub include_secondary: bool,
    #[serde(default)]
    pub count_secondary_as_one: bool,
}

/// Multiplier per selected group for every exercise that targets at least one
/// of them. When an exercise lists a group as both primary and secondary the
/// secondary credit is applied last and wins.
pub fn exercise_multipliers(
    memberships: &[ExerciseGroupMembership],
    selection: &GroupSelection,
) -> BTreeMap<i64, BTreeMap<String, f64>> {
    let mut out = BTreeMap::new();
    for exercise in memberships {
        let mut multipliers: BTreeMap<String, f64> = BTreeMap::new();
        for group in &selection.groups {
            if exercise.primary.contains(group) {
                multipliers.insert(group.clone(), 1.0);
            }
            if selection.include_secondary {
                if let Some(weight) = exercise.secondary.as_ref().and_then(|s| s.get(group)) {
                    let value = if selection.count_secondary_as_one {
                        1.0
                    } else {
                        *weight
                    };
                    multipliers.insert(group.clone(), value);
                }
            }
        }
        if !multipliers.is_empty() {
            out.insert(exercise.exercise_id, multipliers);
        }
    }
    out
}

/// Per-date set counts for the selected groups.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupSetCounts {
    /// Calendar ordered, not gap filled.
    pub rows: Vec<ChartRow>,
    /// Selected groups that never reached a total above zero.
    pub empty_groups: Vec<String>,
}

/// Sum each exercise's multipliers once per completed set, bucketed by the
/// set's date.
pub fn aggregate_group_sets(
    multipliers: &BTreeMap<i64, BTreeMap<String, f64>>,
    set_dates: &BTreeMap<i64, Vec<NaiveDate>>,
    selection: &GroupSelection,
    formatter: &impl DateKeyFormatter,
) -> GroupSetCounts {
    let mut per_date: BTreeMap<NaiveDate, BTreeMap<&str, f64>> = BTreeMap::new();

    for (exercise_id, groups) in multipliers {
        let Some(dates) = set_dates.get(exercise_id) else {
            continue;
        };
        for date in dates {
            let totals = per_date.entry(*date).or_default();
            for (group, multiplier) in groups {
                *totals.entry(group.as_str()).or_insert(0.0) += multiplier;
            }
        }
    }

    let mut highest: BTreeMap<&str, f64> = BTreeMap::new();
    let mut rows = Vec::with_capacity(per_date.len());
    for (date, totals) in per_date {
        let mut row = ChartRow::placeholder(date, formatter);
        for (group, total) in totals {
            let total = round_two_decimals(total);
            let best = highest.entry(group).or_insert(0.0);
            if total > *best {
                *best = total;
            }
            row.values.insert(CategoryKey::exercise_group(group), total);
        }
        rows.push(row);
    }

    let empty_groups = selection
        .groups
        .iter()
        .filter(|g| highest.get(g.as_str()).is_none_or(|v| *v <= 0.0))
        .cloned()
        .collect();

    GroupSetCounts { rows, empty_groups }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso(d: NaiveDate) -> String {
        d.format("%Y-%m-%d").to_string()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bench() -> ExerciseGroupMembership {
        ExerciseGroupMembership {
            exercise_id: 1,
            primary: BTreeSet::from(["chest".to_string()]),
            secondary: Some(BTreeMap::from([("triceps".to_string(), 0.5)])),
        }
    }

    fn selection(count_as_one: bool) -> GroupSelection {
        GroupSelection {
            groups: vec!["chest".into(), "triceps".into()],
            include_secondary: true,
            count_secondary_as_one: count_as_one,
        }
    }

    #[test]
    fn two_sets_accumulate_primary_and_fractional_secondary() {
        let sel = selection(false);
        let multipliers = exercise_multipliers(&[bench()], &sel);
        let dates = BTreeMap::from([(1, vec![date("2025-03-01"), date("2025-03-01")])]);
        let counts = aggregate_group_sets(&multipliers, &dates, &sel, &iso);

        assert_eq!(counts.rows.len(), 1);
        let row = &counts.rows[0];
        assert_eq!(row.date_key, "2025-03-01");
        assert_eq!(row.get(&CategoryKey::exercise_group("chest")), Some(2.0));
        assert_eq!(row.get(&CategoryKey::exercise_group("triceps")), Some(1.0));
        assert!(counts.empty_groups.is_empty());
    }

    #[test]
    fn count_as_one_caps_each_set_not_the_day() {
        let sel = selection(true);
        let multipliers = exercise_multipliers(&[bench()], &sel);
        let dates = BTreeMap::from([(1, vec![date("2025-03-01"); 3])]);
        let counts = aggregate_group_sets(&multipliers, &dates, &sel, &iso);
        assert_eq!(
            counts.rows[0].get(&CategoryKey::exercise_group("triceps")),
            Some(3.0)
        );
    }

    #[test]
    fn secondary_wins_when_group_is_listed_twice() {
        let ex = ExerciseGroupMembership {
            exercise_id: 2,
            primary: BTreeSet::from(["chest".to_string()]),
            secondary: Some(BTreeMap::from([("chest".to_string(), 0.25)])),
        };
        let sel = GroupSelection {
            groups: vec!["chest".into()],
            include_secondary: true,
            count_secondary_as_one: false,
        };
        let m = exercise_multipliers(&[ex.clone()], &sel);
        assert_eq!(m[&2]["chest"], 0.25);

        let sel = GroupSelection {
            include_secondary: false,
            ..sel
        };
        let m = exercise_multipliers(&[ex], &sel);
        assert_eq!(m[&2]["chest"], 1.0);
    }

    #[test]
    fn secondary_ignored_unless_included() {
        let sel = GroupSelection {
            groups: vec!["triceps".into()],
            include_secondary: false,
            count_secondary_as_one: false,
        };
        assert!(exercise_multipliers(&[bench()], &sel).is_empty());
    }

    #[test]
    fn groups_without_sets_are_reported_empty() {
        let sel = GroupSelection {
            groups: vec!["chest".into(), "calves".into()],
            include_secondary: false,
            count_secondary_as_one: false,
        };
        let multipliers = exercise_multipliers(&[bench()], &sel);
        let dates = BTreeMap::from([(1, vec![date("2025-03-02"), date("2025-03-01")])]);
        let counts = aggregate_group_sets(&multipliers, &dates, &sel, &iso);
        assert_eq!(counts.empty_groups, vec!["calves".to_string()]);
        assert!(counts.rows.iter().all(|r| r.get(&CategoryKey::exercise_group("calves")).is_none()));
        assert_eq!(counts.rows[0].date_key, "2025-03-01");
    }

    #[test]
    fn fractional_sums_are_rounded() {
        let ex = ExerciseGroupMembership {
            exercise_id: 3,
            primary: BTreeSet::new(),
            secondary: Some(BTreeMap::from([("core".to_string(), 0.1)])),
        };
        let sel = GroupSelection {
            groups: vec!["core".into()],
            include_secondary: true,
            count_secondary_as_one: false,
        };
        let multipliers = exercise_multipliers(&[ex], &sel);
        let dates = BTreeMap::from([(3, vec![date("2025-03-01"); 3])]);
        let counts = aggregate_group_sets(&multipliers, &dates, &sel, &iso);
        assert_eq!(counts.rows[0].get(&CategoryKey::exercise_group("core")), Some(0.3));
    }

    #[test]
    fn parses_group_strings() {
        assert_eq!(
            parse_primary_groups("chest, triceps,unknown"),
            BTreeSet::from(["chest".to_string(), "triceps".to_string()])
        );
        let secondary = parse_secondary_groups("tricepsx0.5,shouldersx2,lower-backx0.25,bad");
        assert_eq!(secondary.len(), 2);
        assert_eq!(secondary["lower-back"], 0.25);
        assert_eq!(group_display_name("lats"), "Mid Back (Lats)");
        assert_eq!(group_display_name("mystery"), "mystery");
    }
}
