// The date-aligned, gap-filled table behind the chart
use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::category::CategoryKey;
use crate::date_key::DateKeyFormatter;

/// One day on the chart. A category missing from `values` means nothing was
/// recorded that day, not zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub date_key: String,
    pub date: NaiveDate,
    pub values: BTreeMap<CategoryKey, f64>,
}

impl ChartRow {
    /// Row without any values.
    pub fn placeholder(date: NaiveDate, formatter: &impl DateKeyFormatter) -> Self {
        Self {
            date_key: formatter.format_date_key(date),
            date,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: CategoryKey, value: f64) -> Self {
        self.values.insert(key, value);
        self
    }

    pub fn get(&self, key: &CategoryKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for ChartRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("date", &self.date_key)?;
        for (key, value) in &self.values {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

/// Round to two decimals to keep repeated fractional sums stable.
pub fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Insert an empty row for every missing day between the earliest and the
/// latest row and return the rows in calendar order.
///
/// Zero or one row is returned unchanged. When two input rows share a date
/// the first one's values win.
pub fn fill_missing_dates(rows: Vec<ChartRow>, formatter: &impl DateKeyFormatter) -> Vec<ChartRow> {
    if rows.len() < 2 {
        return rows;
    }

    let mut by_date: BTreeMap<NaiveDate, ChartRow> = BTreeMap::new();
    for row in rows {
        match by_date.get_mut(&row.date) {
            Some(existing) => {
                for (key, value) in row.values {
                    existing.values.entry(key).or_insert(value);
                }
            }
            None => {
                by_date.insert(row.date, row);
            }
        }
    }

    let (Some(&first), Some(&last)) = (by_date.keys().next(), by_date.keys().next_back()) else {
        return Vec::new();
    };

    let mut filled = Vec::with_capacity(by_date.len());
    for day in first.iter_days().take_while(|d| *d <= last) {
        match by_date.remove(&day) {
            Some(row) => filled.push(row),
            None => filled.push(ChartRow::placeholder(day, formatter)),
        }
    }
    filled
}

/// Union a freshly loaded series into the existing table by date key.
///
/// Values from `new` are added to matching rows; categories already present
/// in `existing` stay exactly as they were. Gaps between the two date ranges
/// are filled afterwards.
pub fn merge_chart_data(
    new: Vec<ChartRow>,
    existing: &[ChartRow],
    formatter: &impl DateKeyFormatter,
) -> Vec<ChartRow> {
    let mut by_key: HashMap<String, ChartRow> = HashMap::with_capacity(existing.len() + new.len());

    for row in existing {
        by_key.insert(row.date_key.clone(), row.clone());
    }

    for row in new {
        match by_key.entry(row.date_key.clone()) {
            Entry::Occupied(mut e) => e.get_mut().values.extend(row.values),
            Entry::Vacant(e) => {
                e.insert(row);
            }
        }
    }

    let mut merged: Vec<ChartRow> = by_key.into_values().collect();
    merged.sort_by_key(|r| r.date);
    fill_missing_dates(merged, formatter)
}

/// First and last charted date.
pub fn date_span(rows: &[ChartRow]) -> Option<(NaiveDate, NaiveDate)> {
    Some((rows.first()?.date, rows.last()?.date))
}

/// Rows inside the optional inclusive date bounds.
pub fn filter_by_date_range(
    rows: &[ChartRow],
    min: Option<NaiveDate>,
    max: Option<NaiveDate>,
) -> Vec<ChartRow> {
    rows.iter()
        .filter(|r| min.map_or(true, |m| r.date >= m) && max.map_or(true, |m| r.date <= m))
        .cloned()
        .collect()
}

/// Highest value per category over `rows`.
pub fn max_values_in(rows: &[ChartRow]) -> BTreeMap<CategoryKey, f64> {
    let mut map: BTreeMap<CategoryKey, f64> = BTreeMap::new();
    for row in rows {
        for (key, &value) in &row.values {
            map.entry(key.clone())
                .and_modify(|m| {
                    if value > *m {
                        *m = value;
                    }
                })
                .or_insert(value);
        }
    }
    map
}

/// Re-express every value of `keys` through `convert`, rounded to two
/// decimals. Other categories are copied untouched.
pub fn convert_values(
    rows: &[ChartRow],
    keys: &BTreeSet<CategoryKey>,
    convert: impl Fn(f64) -> f64,
) -> Vec<ChartRow> {
    rows.iter()
        .map(|row| {
            let mut row = row.clone();
            for (key, value) in row.values.iter_mut() {
                if keys.contains(key) {
                    *value = round_two_decimals(convert(*value));
                }
            }
            row
        })
        .collect()
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

    fn row(s: &str) -> ChartRow {
        ChartRow::placeholder(date(s), &iso)
    }

    #[test]
    fn fills_gap_between_two_rows() {
        let rows = vec![
            row("2025-01-01").with_value(CategoryKey::Calories, 2000.0),
            row("2025-01-04").with_value(CategoryKey::Calories, 2100.0),
        ];
        let filled = fill_missing_dates(rows, &iso);
        let keys: Vec<&str> = filled.iter().map(|r| r.date_key.as_str()).collect();
        assert_eq!(keys, ["2025-01-01", "2025-01-02", "2025-01-03", "2025-01-04"]);
        assert!(filled[1].is_empty());
        assert!(filled[2].is_empty());
        assert_eq!(filled[3].get(&CategoryKey::Calories), Some(2100.0));
    }

    #[test]
    fn zero_or_one_row_is_unchanged() {
        assert!(fill_missing_dates(Vec::new(), &iso).is_empty());
        let single = vec![row("2025-01-01").with_value(CategoryKey::Fat, 70.0)];
        assert_eq!(fill_missing_dates(single.clone(), &iso), single);
    }

    #[test]
    fn fill_orders_by_calendar_date_not_key() {
        // "Feb" sorts before "Jan" as a string.
        let us = |d: NaiveDate| d.format("%b %-d, %Y").to_string();
        let rows = vec![
            ChartRow::placeholder(date("2025-02-01"), &us),
            ChartRow::placeholder(date("2025-01-30"), &us),
        ];
        let filled = fill_missing_dates(rows, &us);
        let keys: Vec<&str> = filled.iter().map(|r| r.date_key.as_str()).collect();
        assert_eq!(keys, ["Jan 30, 2025", "Jan 31, 2025", "Feb 1, 2025"]);
    }

    #[test]
    fn merge_keeps_unrelated_categories() {
        let existing = vec![row("2025-02-01").with_value(CategoryKey::Calories, 2000.0)];
        let new = vec![row("2025-02-01").with_value(CategoryKey::BodyWeight, 80.0)];
        let merged = merge_chart_data(new, &existing, &iso);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].get(&CategoryKey::Calories), Some(2000.0));
        assert_eq!(merged[0].get(&CategoryKey::BodyWeight), Some(80.0));
    }

    #[test]
    fn merge_fills_gap_between_ranges_and_preserves_existing_rows() {
        let existing = vec![
            row("2025-01-01").with_value(CategoryKey::Calories, 1800.0),
            row("2025-01-02").with_value(CategoryKey::Calories, 1900.0),
        ];
        let new = vec![
            row("2025-01-05").with_value(CategoryKey::BodyWeight, 81.0),
            row("2025-01-06").with_value(CategoryKey::BodyWeight, 80.5),
        ];
        let merged = merge_chart_data(new, &existing, &iso);
        assert_eq!(merged.len(), 6);
        assert_eq!(merged[0], existing[0]);
        assert_eq!(merged[1], existing[1]);
        assert!(merged[2].is_empty() && merged[3].is_empty());
        assert_eq!(merged[2].date_key, "2025-01-03");
        assert_eq!(merged[5].get(&CategoryKey::BodyWeight), Some(80.5));
    }

    #[test]
    fn merge_into_empty_table() {
        let new = vec![row("2025-03-01").with_value(CategoryKey::Protein, 150.0)];
        let merged = merge_chart_data(new.clone(), &[], &iso);
        assert_eq!(merged, new);
    }

    #[test]
    fn date_filter_and_maxima() {
        let rows = vec![
            row("2025-01-01").with_value(CategoryKey::Calories, 3000.0),
            row("2025-01-02").with_value(CategoryKey::Calories, 2000.0),
            row("2025-01-03").with_value(CategoryKey::Calories, 2500.0),
        ];
        let filtered = filter_by_date_range(&rows, Some(date("2025-01-02")), None);
        assert_eq!(filtered.len(), 2);
        let maxima = max_values_in(&filtered);
        assert_eq!(maxima.get(&CategoryKey::Calories), Some(&2500.0));
        assert_eq!(date_span(&rows), Some((date("2025-01-01"), date("2025-01-03"))));
    }

    #[test]
    fn convert_touches_only_selected_keys() {
        let rows = vec![
            row("2025-01-01")
                .with_value(CategoryKey::BodyWeight, 100.0)
                .with_value(CategoryKey::Calories, 2000.0),
        ];
        let keys = BTreeSet::from([CategoryKey::BodyWeight]);
        let out = convert_values(&rows, &keys, |v| v * 2.20462);
        assert_eq!(out[0].get(&CategoryKey::BodyWeight), Some(220.46));
        assert_eq!(out[0].get(&CategoryKey::Calories), Some(2000.0));
    }

    #[test]
    fn rows_serialize_with_string_keys() {
        let r = row("2025-01-01").with_value(CategoryKey::Measurement(4), 35.5);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, serde_json::json!({"date": "2025-01-01", "measurement_4": 35.5}));
    }
}
