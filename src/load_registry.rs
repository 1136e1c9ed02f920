use std::collections::{BTreeSet, HashSet};

use crate::category::{CategoryKey, ExerciseStat};

/// Result of asking whether a category may be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    AlreadyLoaded,
    Proceed,
}

/// Categories processed in this session, whether they loaded data, turned
/// out empty, or held no usable values. There is no way to remove a key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadRegistry {
    loaded: HashSet<CategoryKey>,
}

impl LoadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin_load(&self, key: &CategoryKey) -> LoadStatus {
        if self.loaded.contains(key) {
            LoadStatus::AlreadyLoaded
        } else {
            LoadStatus::Proceed
        }
    }

    pub fn mark_loaded(&mut self, key: &CategoryKey) {
        if !self.loaded.contains(key) {
            self.loaded.insert(key.clone());
        }
    }

    pub fn mark_all<'a, I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = &'a CategoryKey>,
    {
        for key in keys {
            self.mark_loaded(key);
        }
    }

    pub fn is_loaded(&self, key: &CategoryKey) -> bool {
        self.loaded.contains(key)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Stats already processed for one exercise; used to disable options.
    pub fn loaded_stats_for_exercise(&self, id: i64) -> BTreeSet<ExerciseStat> {
        self.loaded
            .iter()
            .filter_map(|k| match k {
                CategoryKey::Exercise { stat, exercise_id } if *exercise_id == id => Some(*stat),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_reports_already_loaded() {
        let mut r = LoadRegistry::new();
        assert_eq!(r.try_begin_load(&CategoryKey::Calories), LoadStatus::Proceed);
        r.mark_loaded(&CategoryKey::Calories);
        r.mark_loaded(&CategoryKey::Calories);
        assert_eq!(r.len(), 1);
        assert_eq!(
            r.try_begin_load(&CategoryKey::Calories),
            LoadStatus::AlreadyLoaded
        );
    }

    #[test]
    fn lists_stats_per_exercise() {
        let mut r = LoadRegistry::new();
        r.mark_all(&[
            CategoryKey::exercise(ExerciseStat::WeightMax, 1),
            CategoryKey::exercise(ExerciseStat::NumSets, 1),
            CategoryKey::exercise(ExerciseStat::WeightMax, 2),
            CategoryKey::Measurement(1),
        ]);
        let stats = r.loaded_stats_for_exercise(1);
        assert_eq!(
            stats,
            BTreeSet::from([ExerciseStat::WeightMax, ExerciseStat::NumSets])
        );
    }
}
