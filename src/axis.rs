// Area (primary) and line (secondary) axis buckets
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::category::{CategoryKey, UnitCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AxisBucket {
    Area,
    Line,
}

/// The area axis hosts a single unit category at a time. The line axis may
/// host several, scaled together by the largest maximum among its shown keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AxisAssigner {
    primary_unit_category: Option<UnitCategory>,
    area_keys: Vec<CategoryKey>,
    line_keys: Vec<CategoryKey>,
    unit_categories: BTreeMap<CategoryKey, UnitCategory>,
    hidden: BTreeSet<CategoryKey>,
}

impl AxisAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary_unit_category(&self) -> Option<UnitCategory> {
        self.primary_unit_category
    }

    pub fn area_keys(&self) -> &[CategoryKey] {
        &self.area_keys
    }

    pub fn line_keys(&self) -> &[CategoryKey] {
        &self.line_keys
    }

    pub fn is_shown(&self, key: &CategoryKey) -> bool {
        !self.hidden.contains(key)
    }

    pub fn shown_area_keys(&self) -> Vec<CategoryKey> {
        self.area_keys.iter().filter(|k| self.is_shown(k)).cloned().collect()
    }

    pub fn shown_line_keys(&self) -> Vec<CategoryKey> {
        self.line_keys.iter().filter(|k| self.is_shown(k)).cloned().collect()
    }

    /// Unit categories of the shown line keys.
    pub fn line_unit_categories(&self) -> BTreeSet<UnitCategory> {
        self.line_keys
            .iter()
            .filter(|k| self.is_shown(k))
            .filter_map(|k| self.unit_categories.get(k).copied())
            .collect()
    }

    /// Every key currently on either axis, shown or not.
    pub fn charted_keys(&self) -> BTreeSet<CategoryKey> {
        self.area_keys
            .iter()
            .chain(self.line_keys.iter())
            .cloned()
            .collect()
    }

    pub fn bucket_of(&self, key: &CategoryKey) -> Option<AxisBucket> {
        if self.area_keys.contains(key) {
            Some(AxisBucket::Area)
        } else if self.line_keys.contains(key) {
            Some(AxisBucket::Line)
        } else {
            None
        }
    }

    fn demote_areas(&mut self, unit: UnitCategory) -> Vec<CategoryKey> {
        let demoted = std::mem::take(&mut self.area_keys);
        if let Some(current) = self.primary_unit_category {
            log::debug!(
                "Moving {} area series from {current} to the line axis for {unit}",
                demoted.len()
            );
        }
        self.line_keys.extend(demoted.iter().cloned());
        self.primary_unit_category = Some(unit);
        demoted
    }

    /// Put `keys` on the area axis.
    ///
    /// When `unit` differs from the unit category currently bound to the area
    /// axis, the existing area keys are first moved to the line axis and the
    /// new keys become the only area keys. Returns the demoted keys.
    pub fn load_as_area(&mut self, keys: &[CategoryKey], unit: UnitCategory) -> Vec<CategoryKey> {
        if keys.is_empty() {
            return Vec::new();
        }

        let demoted = match self.primary_unit_category {
            Some(current) if current != unit => self.demote_areas(unit),
            Some(_) => Vec::new(),
            None => {
                self.primary_unit_category = Some(unit);
                Vec::new()
            }
        };

        for key in keys {
            self.unit_categories.insert(key.clone(), unit);
            if !self.area_keys.contains(key) {
                self.area_keys.push(key.clone());
            }
        }
        demoted
    }

    /// Put `keys` on the line axis together with their unit categories.
    pub fn load_as_line(&mut self, keys: &[(CategoryKey, UnitCategory)]) {
        for (key, unit) in keys {
            self.unit_categories.insert(key.clone(), *unit);
            if !self.line_keys.contains(key) {
                self.line_keys.push(key.clone());
            }
        }
    }

    /// Move one area key to the line axis. The last area key stays put.
    pub fn move_to_line(&mut self, key: &CategoryKey) -> bool {
        if self.area_keys.len() < 2 {
            return false;
        }
        let Some(pos) = self.area_keys.iter().position(|k| k == key) else {
            return false;
        };
        let key = self.area_keys.remove(pos);
        self.line_keys.push(key);
        true
    }

    /// Move `key` to the area axis along with every other line key of its
    /// unit category.
    pub fn move_to_area(&mut self, key: &CategoryKey) -> bool {
        if !self.line_keys.contains(key) {
            return false;
        }
        match self.unit_categories.get(key).copied() {
            Some(unit) => self.move_unit_category_to_area(unit),
            None => false,
        }
    }

    /// Promote every line key of `unit` to the area axis. Area keys of a
    /// different unit category are demoted to the line axis.
    pub fn move_unit_category_to_area(&mut self, unit: UnitCategory) -> bool {
        let (promoted, remaining): (Vec<CategoryKey>, Vec<CategoryKey>) = std::mem::take(
            &mut self.line_keys,
        )
        .into_iter()
        .partition(|k| self.unit_categories.get(k) == Some(&unit));
        self.line_keys = remaining;
        if promoted.is_empty() {
            return false;
        }

        if self.primary_unit_category != Some(unit) {
            self.demote_areas(unit);
        }
        self.area_keys.extend(promoted);
        true
    }

    /// Show exactly `shown` among the area keys.
    pub fn set_shown_areas(&mut self, shown: &BTreeSet<CategoryKey>) {
        for key in &self.area_keys {
            if shown.contains(key) {
                self.hidden.remove(key);
            } else {
                self.hidden.insert(key.clone());
            }
        }
    }

    /// Show exactly `shown` among the line keys.
    pub fn set_shown_lines(&mut self, shown: &BTreeSet<CategoryKey>) {
        for key in &self.line_keys {
            if shown.contains(key) {
                self.hidden.remove(key);
            } else {
                self.hidden.insert(key.clone());
            }
        }
    }

    /// Area keys ordered by maximum, highest first. Keys without a usable
    /// maximum go last in load order.
    pub fn ordered_area_keys(&self, maxima: &BTreeMap<CategoryKey, f64>) -> Vec<CategoryKey> {
        let mut keys = self.area_keys.clone();
        keys.sort_by(|a, b| {
            let va = maxima.get(a).copied().unwrap_or(f64::NEG_INFINITY);
            let vb = maxima.get(b).copied().unwrap_or(f64::NEG_INFINITY);
            vb.total_cmp(&va)
        });
        keys
    }

    /// Shown area key whose maximum sizes the primary axis.
    pub fn primary_domain_key(&self, maxima: &BTreeMap<CategoryKey, f64>) -> Option<CategoryKey> {
        self.ordered_area_keys(maxima)
            .into_iter()
            .find(|k| self.is_shown(k))
    }

    /// Shown line key with the largest maximum across every unit category
    /// on the line axis.
    pub fn secondary_domain_key(&self, maxima: &BTreeMap<CategoryKey, f64>) -> Option<CategoryKey> {
        self.line_keys
            .iter()
            .filter(|k| self.is_shown(k))
            .filter_map(|k| maxima.get(k).map(|v| (k, *v)))
            .fold(None::<(&CategoryKey, f64)>, |best, (k, v)| match best {
                Some((_, bv)) if bv >= v => best,
                _ => Some((k, v)),
            })
            .map(|(k, _)| k.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::ExerciseStat;

    fn key(stat: ExerciseStat, id: i64) -> CategoryKey {
        CategoryKey::exercise(stat, id)
    }

    #[test]
    fn first_area_load_binds_unit_category() {
        let mut axis = AxisAssigner::new();
        axis.load_as_area(&[CategoryKey::BodyWeight], UnitCategory::Weight);
        assert_eq!(axis.primary_unit_category(), Some(UnitCategory::Weight));
        assert_eq!(axis.area_keys(), [CategoryKey::BodyWeight]);
    }

    #[test]
    fn same_unit_appends() {
        let mut axis = AxisAssigner::new();
        axis.load_as_area(&[CategoryKey::BodyWeight], UnitCategory::Weight);
        let demoted = axis.load_as_area(&[key(ExerciseStat::WeightMax, 1)], UnitCategory::Weight);
        assert!(demoted.is_empty());
        assert_eq!(axis.area_keys().len(), 2);
        assert!(axis.line_keys().is_empty());
    }

    #[test]
    fn conflicting_unit_demotes_existing_areas() {
        let mut axis = AxisAssigner::new();
        let a = key(ExerciseStat::WeightMax, 1);
        let b = key(ExerciseStat::NumRepsMax, 1);
        axis.load_as_area(&[a.clone()], UnitCategory::Weight);
        let demoted = axis.load_as_area(&[b.clone()], UnitCategory::NumberOfReps);

        assert_eq!(demoted, vec![a.clone()]);
        assert_eq!(axis.area_keys(), [b.clone()]);
        assert!(axis.line_keys().contains(&a));
        assert!(axis.line_unit_categories().contains(&UnitCategory::Weight));
        assert_eq!(axis.primary_unit_category(), Some(UnitCategory::NumberOfReps));
        assert_eq!(axis.bucket_of(&a), Some(AxisBucket::Line));
        assert_eq!(axis.bucket_of(&b), Some(AxisBucket::Area));
    }

    #[test]
    fn line_axis_hosts_many_unit_categories() {
        let mut axis = AxisAssigner::new();
        axis.load_as_line(&[(CategoryKey::Calories, UnitCategory::Calories)]);
        axis.load_as_line(&[(CategoryKey::Fat, UnitCategory::Macros)]);
        assert_eq!(axis.line_keys().len(), 2);
        assert_eq!(axis.line_unit_categories().len(), 2);
        assert_eq!(axis.primary_unit_category(), None);
    }

    #[test]
    fn domain_keys_follow_maxima() {
        let mut axis = AxisAssigner::new();
        axis.load_as_area(&[CategoryKey::Fat, CategoryKey::Protein], UnitCategory::Macros);
        axis.load_as_line(&[
            (CategoryKey::Calories, UnitCategory::Calories),
            (CategoryKey::BodyWeight, UnitCategory::Weight),
        ]);
        let maxima = BTreeMap::from([
            (CategoryKey::Fat, 90.0),
            (CategoryKey::Protein, 180.0),
            (CategoryKey::Calories, 2600.0),
            (CategoryKey::BodyWeight, 82.0),
        ]);
        assert_eq!(axis.primary_domain_key(&maxima), Some(CategoryKey::Protein));
        assert_eq!(
            axis.ordered_area_keys(&maxima),
            vec![CategoryKey::Protein, CategoryKey::Fat]
        );
        assert_eq!(axis.secondary_domain_key(&maxima), Some(CategoryKey::Calories));
        assert_eq!(axis.charted_keys().len(), 4);
    }

    #[test]
    fn hidden_series_do_not_size_the_axes() {
        let mut axis = AxisAssigner::new();
        axis.load_as_area(&[CategoryKey::Fat, CategoryKey::Protein], UnitCategory::Macros);
        axis.load_as_line(&[
            (CategoryKey::Calories, UnitCategory::Calories),
            (CategoryKey::BodyWeight, UnitCategory::Weight),
        ]);
        let maxima = BTreeMap::from([
            (CategoryKey::Fat, 90.0),
            (CategoryKey::Protein, 180.0),
            (CategoryKey::Calories, 2600.0),
            (CategoryKey::BodyWeight, 82.0),
        ]);

        axis.set_shown_areas(&BTreeSet::from([CategoryKey::Fat]));
        axis.set_shown_lines(&BTreeSet::from([CategoryKey::BodyWeight]));
        assert_eq!(axis.primary_domain_key(&maxima), Some(CategoryKey::Fat));
        assert_eq!(axis.secondary_domain_key(&maxima), Some(CategoryKey::BodyWeight));
        assert_eq!(axis.shown_area_keys(), vec![CategoryKey::Fat]);
        assert_eq!(
            axis.line_unit_categories(),
            BTreeSet::from([UnitCategory::Weight])
        );
        // Hidden keys stay charted.
        assert_eq!(axis.charted_keys().len(), 4);

        axis.set_shown_lines(&BTreeSet::new());
        assert_eq!(axis.secondary_domain_key(&maxima), None);
        assert!(axis.line_unit_categories().is_empty());
    }

    #[test]
    fn move_to_area_promotes_whole_unit_category() {
        let mut axis = AxisAssigner::new();
        let max = key(ExerciseStat::WeightMax, 1);
        let min = key(ExerciseStat::WeightMin, 1);
        axis.load_as_area(&[CategoryKey::Calories], UnitCategory::Calories);
        axis.load_as_line(&[
            (max.clone(), UnitCategory::Weight),
            (CategoryKey::Fat, UnitCategory::Macros),
            (min.clone(), UnitCategory::Weight),
        ]);

        assert!(axis.move_to_area(&max));
        assert_eq!(axis.area_keys(), [max.clone(), min.clone()]);
        assert_eq!(axis.line_keys(), [CategoryKey::Fat, CategoryKey::Calories]);
        assert_eq!(axis.primary_unit_category(), Some(UnitCategory::Weight));
        assert!(axis.line_unit_categories().contains(&UnitCategory::Calories));

        assert!(!axis.move_to_area(&max));
        assert!(!axis.move_unit_category_to_area(UnitCategory::Rpe));
    }

    #[test]
    fn move_to_area_with_matching_unit_keeps_areas() {
        let mut axis = AxisAssigner::new();
        axis.load_as_area(&[CategoryKey::Fat], UnitCategory::Macros);
        axis.load_as_line(&[(CategoryKey::Protein, UnitCategory::Macros)]);

        assert!(axis.move_to_area(&CategoryKey::Protein));
        assert_eq!(axis.area_keys(), [CategoryKey::Fat, CategoryKey::Protein]);
        assert!(axis.line_keys().is_empty());
    }

    #[test]
    fn move_to_line_keeps_the_last_area_key() {
        let mut axis = AxisAssigner::new();
        axis.load_as_area(&[CategoryKey::Fat, CategoryKey::Protein], UnitCategory::Macros);

        assert!(axis.move_to_line(&CategoryKey::Fat));
        assert_eq!(axis.area_keys(), [CategoryKey::Protein]);
        assert_eq!(axis.line_keys(), [CategoryKey::Fat]);
        assert!(axis.line_unit_categories().contains(&UnitCategory::Macros));

        assert!(!axis.move_to_line(&CategoryKey::Protein));
        assert_eq!(axis.area_keys(), [CategoryKey::Protein]);
        assert!(!axis.move_to_line(&CategoryKey::Calories));
    }

    #[test]
    fn empty_area_load_is_ignored() {
        let mut axis = AxisAssigner::new();
        axis.load_as_area(&[], UnitCategory::Weight);
        assert_eq!(axis.primary_unit_category(), None);
    }
}
