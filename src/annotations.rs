// Free-text comments pinned to chart dates, stored once per date and record
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::category::CategoryKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub related_keys: BTreeSet<CategoryKey>,
    pub label: String,
    pub text: String,
}

/// Date key to the annotations shown on that date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnnotationTable {
    entries: BTreeMap<String, Vec<Annotation>>,
}

/// True if any of `siblings` is already charted, meaning the comments
/// backing them were recorded by an earlier load.
pub fn any_sibling_loaded<'a, I>(siblings: I, charted: &BTreeSet<CategoryKey>) -> bool
where
    I: IntoIterator<Item = &'a CategoryKey>,
{
    siblings.into_iter().any(|k| charted.contains(k))
}

impl AnnotationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a comment under `date_key` unless a sibling category already
    /// brought it in. Returns whether anything was inserted.
    pub fn attach(
        &mut self,
        date_key: &str,
        siblings: &BTreeSet<CategoryKey>,
        label: &str,
        text: &str,
        already_loaded: bool,
    ) -> bool {
        if already_loaded {
            return false;
        }
        self.entries
            .entry(date_key.to_string())
            .or_default()
            .push(Annotation {
                related_keys: siblings.clone(),
                label: label.to_string(),
                text: text.to_string(),
            });
        true
    }

    /// Add `new_keys` to every annotation already related to `existing`.
    pub fn link_related_keys(&mut self, existing: &CategoryKey, new_keys: &BTreeSet<CategoryKey>) {
        for annotation in self.entries.values_mut().flatten() {
            if annotation.related_keys.contains(existing) {
                annotation.related_keys.extend(new_keys.iter().cloned());
            }
        }
    }

    pub fn get(&self, date_key: &str) -> &[Annotation] {
        self.entries
            .get(date_key)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Annotation>)> {
        self.entries.iter()
    }

    /// Total number of annotations across all dates.
    pub fn len(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diet_keys() -> BTreeSet<CategoryKey> {
        CategoryKey::diet_log_keys().into_iter().collect()
    }

    #[test]
    fn attach_skips_when_sibling_loaded() {
        let mut table = AnnotationTable::new();
        let keys = diet_keys();
        let mut charted = BTreeSet::new();

        let loaded = any_sibling_loaded(&keys, &charted);
        assert!(table.attach("2025-01-01", &keys, "Diet Log Comment", "cheat day", loaded));
        charted.insert(CategoryKey::Calories);

        let loaded = any_sibling_loaded(&keys, &charted);
        assert!(!table.attach("2025-01-01", &keys, "Diet Log Comment", "cheat day", loaded));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("2025-01-01")[0].text, "cheat day");
    }

    #[test]
    fn several_comments_per_date() {
        let mut table = AnnotationTable::new();
        let keys = BTreeSet::from([CategoryKey::BodyWeight]);
        table.attach("d", &keys, "A", "one", false);
        table.attach("d", &keys, "B", "two", false);
        assert_eq!(table.get("d").len(), 2);
        assert!(table.get("other").is_empty());
    }

    #[test]
    fn linking_extends_related_keys() {
        let mut table = AnnotationTable::new();
        let a = CategoryKey::Measurement(1);
        let b = CategoryKey::Measurement(2);
        table.attach("d", &BTreeSet::from([a.clone()]), "Comment", "x", false);
        table.attach("e", &BTreeSet::from([CategoryKey::Fat]), "Comment", "y", false);
        table.link_related_keys(&a, &BTreeSet::from([b.clone()]));
        assert!(table.get("d")[0].related_keys.contains(&b));
        assert!(!table.get("e")[0].related_keys.contains(&b));
    }
}
