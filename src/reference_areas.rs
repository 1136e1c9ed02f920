use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::date_key::DateKeyFormatter;
use crate::sources::TimePeriod;

/// Shaded calendar range drawn behind the series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceArea {
    pub id: i64,
    pub start_date_key: String,
    pub end_date_key: String,
    pub label: String,
    pub raw_start: NaiveDate,
    /// `None` for a period that is still ongoing.
    pub raw_end: Option<NaiveDate>,
}

impl ReferenceArea {
    /// Build an area for `period`, clamped to the charted `span`.
    ///
    /// An ongoing period ends on `today`. Returns `None` when the period has
    /// no start date, nothing is charted yet or the period lies entirely
    /// outside the span.
    pub fn from_time_period(
        period: &TimePeriod,
        span: Option<(NaiveDate, NaiveDate)>,
        today: NaiveDate,
        formatter: &impl DateKeyFormatter,
    ) -> Option<Self> {
        let start = period.start_date?;
        let (chart_start, chart_end) = span?;
        let end = period.end_date.unwrap_or(today);

        let shown_start = start.max(chart_start);
        let shown_end = end.min(chart_end);
        if shown_start > shown_end {
            return None;
        }

        Some(Self {
            id: period.id,
            start_date_key: formatter.format_date_key(shown_start),
            end_date_key: formatter.format_date_key(shown_end),
            label: period.name.clone(),
            raw_start: start,
            raw_end: period.end_date,
        })
    }
}

/// All reference areas of a session plus the subset currently shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceAreaManager {
    areas: Vec<ReferenceArea>,
    shown: BTreeSet<i64>,
}

impl ReferenceAreaManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `area` unless one with the same id exists. New areas are shown.
    pub fn add(&mut self, area: ReferenceArea) -> bool {
        if self.contains(area.id) {
            return false;
        }
        self.shown.insert(area.id);
        self.areas.push(area);
        true
    }

    pub fn remove(&mut self, id: i64) {
        self.areas.retain(|a| a.id != id);
        self.shown.remove(&id);
    }

    /// Remove the area with `id` if present, otherwise build it with
    /// `factory` and add it.
    pub fn toggle_by_id<F>(&mut self, id: i64, factory: F)
    where
        F: FnOnce() -> ReferenceArea,
    {
        if self.contains(id) {
            self.remove(id);
        } else {
            self.add(factory());
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.areas.iter().any(|a| a.id == id)
    }

    pub fn areas(&self) -> &[ReferenceArea] {
        &self.areas
    }

    /// Restrict the shown areas to `ids`. Unknown ids are ignored.
    pub fn set_shown(&mut self, ids: &BTreeSet<i64>) {
        self.shown = self
            .areas
            .iter()
            .map(|a| a.id)
            .filter(|id| ids.contains(id))
            .collect();
    }

    pub fn shown(&self) -> Vec<&ReferenceArea> {
        self.areas
            .iter()
            .filter(|a| self.shown.contains(&a.id))
            .collect()
    }

    pub fn clear(&mut self) {
        self.areas.clear();
        self.shown.clear();
    }
}
