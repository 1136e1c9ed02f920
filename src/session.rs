// One analytics session: the chart table and every accumulator around it
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::annotations::{AnnotationTable, any_sibling_loaded};
use crate::axis::AxisAssigner;
use crate::category::{CategoryKey, ExerciseStat, SeriesMetadata, UnitCategory};
use crate::chart_data::{
    ChartRow, convert_values, date_span, fill_missing_dates, filter_by_date_range, max_values_in,
    merge_chart_data, round_two_decimals,
};
use crate::date_key::{DateKeyFormatter, LocaleDateFormat};
use crate::error::{LoadError, SourceKind};
use crate::exercise_groups::{
    EXERCISE_GROUPS, GroupSelection, aggregate_group_sets, exercise_multipliers,
    group_display_name,
};
use crate::load_registry::{LoadRegistry, LoadStatus};
use crate::max_values::MaxValueTracker;
use crate::reference_areas::{ReferenceArea, ReferenceAreaManager};
use crate::set_analytics::{SetAnalyticsOptions, analyze_set_list, stat_unit};
use crate::settings::AnalyticsSettings;
use crate::sources::{CompletedSet, DietLog, MeasurementType, RecordSource, TimePeriod};
use crate::units::{DisplayUnit, LengthUnit, StandardUnits, UnitConverter};

const DIET_LOG_COMMENT: &str = "Diet Log Comment";
const BODY_MEASUREMENTS_COMMENT: &str = "Body Measurements Comment";
const WORKOUT_COMMENT: &str = "Workout Comment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietMetric {
    Calories,
    Fat,
    Carbs,
    Protein,
}

impl DietMetric {
    pub fn key(self) -> CategoryKey {
        match self {
            DietMetric::Calories => CategoryKey::Calories,
            DietMetric::Fat => CategoryKey::Fat,
            DietMetric::Carbs => CategoryKey::Carbs,
            DietMetric::Protein => CategoryKey::Protein,
        }
    }

    fn unit(self) -> &'static str {
        match self {
            DietMetric::Calories => "kcal",
            _ => "g",
        }
    }

    /// Calories must be positive, macros may be zero.
    fn value(self, log: &DietLog) -> Option<f64> {
        let valid_macro = |v: &f64| v.is_finite() && *v >= 0.0;
        match self {
            DietMetric::Calories => Some(log.calories).filter(|v| v.is_finite() && *v > 0.0),
            DietMetric::Fat => log.fat.filter(valid_macro),
            DietMetric::Carbs => log.carbs.filter(valid_macro),
            DietMetric::Protein => log.protein.filter(valid_macro),
        }
    }
}

/// A request replayed against a session, e.g. from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadRequest {
    Diet {
        metric: DietMetric,
        #[serde(default)]
        as_area: bool,
    },
    BodyWeight {
        #[serde(default)]
        as_area: bool,
    },
    BodyFat {
        #[serde(default)]
        as_area: bool,
    },
    Measurement {
        measurement_id: i64,
        #[serde(default)]
        as_area: bool,
    },
    /// Stats whose unit category equals `area_unit_category` go on the area
    /// axis, the rest on the line axis.
    ExerciseStats {
        exercise_id: i64,
        stats: BTreeSet<ExerciseStat>,
        #[serde(default)]
        area_unit_category: Option<UnitCategory>,
    },
    ExerciseGroups {
        groups: Vec<String>,
        #[serde(default)]
        as_area: bool,
    },
    TimePeriod {
        time_period_id: i64,
    },
    ChangeUnit {
        unit_category: UnitCategory,
        unit: String,
    },
    DateFilter {
        #[serde(default)]
        min: Option<NaiveDate>,
        #[serde(default)]
        max: Option<NaiveDate>,
    },
    /// Promote the key's whole unit category to the area axis.
    MoveToArea {
        key: CategoryKey,
    },
    MoveToLine {
        key: CategoryKey,
    },
    MoveUnitCategoryToArea {
        unit_category: UnitCategory,
    },
    ShowAreas {
        keys: BTreeSet<CategoryKey>,
    },
    ShowLines {
        keys: BTreeSet<CategoryKey>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Categories that were charted.
    Loaded(Vec<CategoryKey>),
    AlreadyLoaded,
    /// A non-load request changed the session.
    Applied,
    /// A non-load request had nothing to do.
    Unchanged,
}

/// Read-only snapshot handed to a chart renderer.
#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub rows: Vec<ChartRow>,
    /// Highest maximum first.
    pub area_keys: Vec<CategoryKey>,
    pub line_keys: Vec<CategoryKey>,
    pub shown_area_keys: Vec<CategoryKey>,
    pub shown_line_keys: Vec<CategoryKey>,
    pub primary_unit_category: Option<UnitCategory>,
    pub line_unit_categories: BTreeSet<UnitCategory>,
    pub primary_domain_key: Option<CategoryKey>,
    pub secondary_domain_key: Option<CategoryKey>,
    pub maxima: BTreeMap<CategoryKey, f64>,
    pub metadata: BTreeMap<CategoryKey, SeriesMetadata>,
    pub annotations: AnnotationTable,
    pub reference_areas: Vec<ReferenceArea>,
    pub multiset_dates: BTreeMap<String, BTreeSet<CategoryKey>>,
    pub disabled_exercise_groups: BTreeSet<String>,
}

/// A record whose comment backs several series. Body measurement entries
/// and measurement entries number their ids independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CommentedRecord {
    BodyMeasurement(i64),
    MeasurementEntry(i64),
}

struct PendingAnnotation {
    date_key: String,
    siblings: BTreeSet<CategoryKey>,
    label: String,
    text: String,
}

/// Everything a load produced before it is committed to the session.
struct PendingLoad {
    rows: Vec<ChartRow>,
    series: Vec<(CategoryKey, SeriesMetadata)>,
    area_unit: Option<UnitCategory>,
    annotations: Vec<PendingAnnotation>,
    commented_records: HashSet<CommentedRecord>,
    comment_link: Option<(CategoryKey, BTreeSet<CategoryKey>)>,
    multiset_dates: Vec<String>,
}

impl PendingLoad {
    fn new(area_unit: Option<UnitCategory>) -> Self {
        Self {
            rows: Vec::new(),
            series: Vec::new(),
            area_unit,
            annotations: Vec::new(),
            commented_records: HashSet::new(),
            comment_link: None,
            multiset_dates: Vec::new(),
        }
    }

    fn keys(&self) -> Vec<CategoryKey> {
        self.series.iter().map(|(k, _)| k.clone()).collect()
    }

    fn annotate(&mut self, date_key: &str, siblings: &BTreeSet<CategoryKey>, label: &str, text: &str) {
        self.annotations.push(PendingAnnotation {
            date_key: date_key.to_string(),
            siblings: siblings.clone(),
            label: label.to_string(),
            text: text.to_string(),
        });
    }
}

fn area_unit(as_area: bool, unit: UnitCategory) -> Option<UnitCategory> {
    as_area.then_some(unit)
}

fn applied(changed: bool) -> LoadOutcome {
    if changed {
        LoadOutcome::Applied
    } else {
        LoadOutcome::Unchanged
    }
}

fn key_list(keys: &[CategoryKey]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct AnalyticsSession<U = StandardUnits> {
    settings: AnalyticsSettings,
    units: U,
    /// Active display units, changed by [`AnalyticsSession::change_unit`].
    options: SetAnalyticsOptions,
    circumference_unit: LengthUnit,
    formatter: LocaleDateFormat,
    rows: Vec<ChartRow>,
    metadata: BTreeMap<CategoryKey, SeriesMetadata>,
    tracker: MaxValueTracker,
    registry: LoadRegistry,
    annotations: AnnotationTable,
    axis: AxisAssigner,
    reference_areas: ReferenceAreaManager,
    commented_records: HashSet<CommentedRecord>,
    multiset_dates: BTreeMap<String, BTreeSet<CategoryKey>>,
    disabled_groups: BTreeSet<String>,
    filter_min: Option<NaiveDate>,
    filter_max: Option<NaiveDate>,
}

impl AnalyticsSession<StandardUnits> {
    pub fn new(settings: AnalyticsSettings) -> Self {
        Self::with_units(settings, StandardUnits)
    }
}

impl<U: UnitConverter> AnalyticsSession<U> {
    pub fn with_units(settings: AnalyticsSettings, units: U) -> Self {
        Self {
            options: settings.set_analytics_options(),
            circumference_unit: settings.circumference_unit,
            formatter: LocaleDateFormat::new(settings.locale.clone()),
            settings,
            units,
            rows: Vec::new(),
            metadata: BTreeMap::new(),
            tracker: MaxValueTracker::new(),
            registry: LoadRegistry::new(),
            annotations: AnnotationTable::new(),
            axis: AxisAssigner::new(),
            reference_areas: ReferenceAreaManager::new(),
            commented_records: HashSet::new(),
            multiset_dates: BTreeMap::new(),
            disabled_groups: BTreeSet::new(),
            filter_min: None,
            filter_max: None,
        }
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    pub fn rows(&self) -> &[ChartRow] {
        &self.rows
    }

    pub fn metadata(&self) -> &BTreeMap<CategoryKey, SeriesMetadata> {
        &self.metadata
    }

    pub fn tracker(&self) -> &MaxValueTracker {
        &self.tracker
    }

    pub fn registry(&self) -> &LoadRegistry {
        &self.registry
    }

    pub fn annotations(&self) -> &AnnotationTable {
        &self.annotations
    }

    pub fn axis(&self) -> &AxisAssigner {
        &self.axis
    }

    pub fn reference_areas(&self) -> &ReferenceAreaManager {
        &self.reference_areas
    }

    /// Date keys with multiset sets and the exercise keys they belong to.
    pub fn multiset_dates(&self) -> &BTreeMap<String, BTreeSet<CategoryKey>> {
        &self.multiset_dates
    }

    /// Groups that cannot be requested again in this session.
    pub fn disabled_exercise_groups(&self) -> &BTreeSet<String> {
        &self.disabled_groups
    }

    pub fn loaded_stats_for_exercise(&self, exercise_id: i64) -> BTreeSet<ExerciseStat> {
        self.registry.loaded_stats_for_exercise(exercise_id)
    }

    fn already_loaded(&self, key: &CategoryKey) -> bool {
        if self.registry.try_begin_load(key) == LoadStatus::AlreadyLoaded {
            log::debug!("{key} already loaded, skipping");
            return true;
        }
        false
    }

    fn empty_source(&mut self, source: SourceKind, keys: &[CategoryKey]) -> LoadError {
        self.registry.mark_all(keys);
        log::warn!("No {source} recorded, marked {} as loaded", key_list(keys));
        LoadError::EmptySource { source }
    }

    /// Record maxima, then merge rows and assign axes for the usable keys.
    fn commit(&mut self, load: PendingLoad) -> Result<LoadOutcome, LoadError> {
        let keys = load.keys();

        for row in &load.rows {
            for (key, value) in &row.values {
                if keys.contains(key) {
                    self.tracker.record_observation(key, *value);
                }
            }
        }

        let usable = self.tracker.filter_usable(&keys);
        if usable.is_empty() {
            self.registry.mark_all(&keys);
            log::warn!("No usable values for {}", key_list(&keys));
            return Err(LoadError::NoUsableValues { keys });
        }

        if let Some((existing, new_keys)) = &load.comment_link {
            self.annotations.link_related_keys(existing, new_keys);
        }
        for a in &load.annotations {
            self.annotations
                .attach(&a.date_key, &a.siblings, &a.label, &a.text, false);
        }
        self.commented_records
            .extend(load.commented_records.iter().copied());
        for date_key in &load.multiset_dates {
            self.multiset_dates
                .entry(date_key.clone())
                .or_default()
                .extend(usable.iter().cloned());
        }

        let new_rows = fill_missing_dates(load.rows, &self.formatter);
        self.rows = merge_chart_data(new_rows, &self.rows, &self.formatter);

        let mut area_keys = Vec::new();
        let mut line_keys = Vec::new();
        for (key, meta) in load.series {
            if !usable.contains(&key) {
                continue;
            }
            if Some(meta.unit_category) == load.area_unit {
                area_keys.push(key.clone());
            } else {
                line_keys.push((key.clone(), meta.unit_category));
            }
            self.metadata.insert(key, meta);
        }
        if let Some(unit) = load.area_unit {
            self.axis.load_as_area(&area_keys, unit);
        }
        self.axis.load_as_line(&line_keys);

        self.registry.mark_all(&keys);
        log::info!(
            "Loaded {} ({} chart rows)",
            key_list(&usable),
            self.rows.len()
        );
        Ok(LoadOutcome::Loaded(usable))
    }

    /// Calories or one macro from the diet logs.
    pub fn load_diet_metric(
        &mut self,
        source: &impl RecordSource,
        metric: DietMetric,
        as_area: bool,
    ) -> Result<LoadOutcome, LoadError> {
        let key = metric.key();
        if self.already_loaded(&key) {
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let logs = source.diet_logs(true);
        if logs.is_empty() {
            return Err(self.empty_source(SourceKind::DietLogs, &CategoryKey::diet_log_keys()));
        }

        let siblings: BTreeSet<CategoryKey> = CategoryKey::diet_log_keys().into_iter().collect();
        let comments_loaded = any_sibling_loaded(&siblings, &self.axis.charted_keys());

        let mut load = PendingLoad::new(area_unit(as_area, key.unit_category()));
        for entry in &logs {
            let Some(value) = metric.value(entry) else {
                continue;
            };
            let row = ChartRow::placeholder(entry.date, &self.formatter)
                .with_value(key.clone(), value);
            if !comments_loaded {
                if let Some(comment) = &entry.comment {
                    load.annotate(&row.date_key, &siblings, DIET_LOG_COMMENT, comment);
                }
            }
            load.rows.push(row);
        }

        load.series.push((
            key.clone(),
            SeriesMetadata {
                label: key.default_label(),
                unit: metric.unit().into(),
                unit_category: key.unit_category(),
            },
        ));
        self.commit(load)
    }

    fn queue_body_measurement_comment(
        &self,
        load: &mut PendingLoad,
        record: CommentedRecord,
        comment: Option<&str>,
        date_key: &str,
        siblings: &BTreeSet<CategoryKey>,
    ) {
        let Some(text) = comment else {
            return;
        };
        if self.commented_records.contains(&record) || !load.commented_records.insert(record) {
            return;
        }
        load.annotate(date_key, siblings, BODY_MEASUREMENTS_COMMENT, text);
    }

    /// Body weight in the active weight unit, first entry of each day only.
    pub fn load_body_weight(
        &mut self,
        source: &impl RecordSource,
        as_area: bool,
    ) -> Result<LoadOutcome, LoadError> {
        let key = CategoryKey::BodyWeight;
        if self.already_loaded(&key) {
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let entries: Vec<_> = source
            .body_measurements()
            .into_iter()
            .filter(|e| e.weight.is_finite() && e.weight > 0.0)
            .collect();
        if entries.is_empty() {
            return Err(self.empty_source(SourceKind::BodyWeights, &[key]));
        }

        let siblings = BTreeSet::from([key.clone()]);
        let mut load = PendingLoad::new(area_unit(as_area, UnitCategory::Weight));
        let mut seen = HashSet::new();
        for entry in &entries {
            let date = entry.date.date();
            if !seen.insert(date) {
                continue;
            }
            let date_key = self.formatter.format_date_key(date);
            self.queue_body_measurement_comment(
                &mut load,
                CommentedRecord::BodyMeasurement(entry.id),
                entry.comment.as_deref(),
                &date_key,
                &siblings,
            );
            let value = round_two_decimals(self.units.convert(
                entry.weight,
                entry.weight_unit.into(),
                self.options.weight_unit.into(),
            ));
            load.rows
                .push(ChartRow::placeholder(date, &self.formatter).with_value(key.clone(), value));
        }

        load.series.push((
            key.clone(),
            SeriesMetadata {
                label: key.default_label(),
                unit: self.options.weight_unit.to_string(),
                unit_category: UnitCategory::Weight,
            },
        ));
        self.commit(load)
    }

    /// Body fat percentage, first entry of each day only.
    pub fn load_body_fat(
        &mut self,
        source: &impl RecordSource,
        as_area: bool,
    ) -> Result<LoadOutcome, LoadError> {
        let key = CategoryKey::BodyFatPercentage;
        if self.already_loaded(&key) {
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let entries: Vec<_> = source
            .body_measurements()
            .into_iter()
            .filter(|e| e.body_fat_percentage.is_some())
            .collect();
        if entries.is_empty() {
            return Err(self.empty_source(SourceKind::BodyFat, &[key]));
        }

        let siblings = BTreeSet::from([key.clone()]);
        let mut load = PendingLoad::new(area_unit(as_area, UnitCategory::BodyFat));
        let mut seen = HashSet::new();
        for entry in &entries {
            let Some(value) = entry
                .body_fat_percentage
                .filter(|v| v.is_finite() && *v > 0.0)
            else {
                continue;
            };
            let date = entry.date.date();
            if !seen.insert(date) {
                continue;
            }
            let date_key = self.formatter.format_date_key(date);
            self.queue_body_measurement_comment(
                &mut load,
                CommentedRecord::BodyMeasurement(entry.id),
                entry.comment.as_deref(),
                &date_key,
                &siblings,
            );
            load.rows.push(
                ChartRow::placeholder(date, &self.formatter)
                    .with_value(key.clone(), round_two_decimals(value)),
            );
        }

        load.series.push((
            key.clone(),
            SeriesMetadata {
                label: key.default_label(),
                unit: "%".into(),
                unit_category: UnitCategory::BodyFat,
            },
        ));
        self.commit(load)
    }

    /// One caliper or circumference measurement.
    pub fn load_measurement(
        &mut self,
        source: &impl RecordSource,
        measurement_id: i64,
        as_area: bool,
    ) -> Result<LoadOutcome, LoadError> {
        let key = CategoryKey::Measurement(measurement_id);
        if self.already_loaded(&key) {
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let kind = SourceKind::Measurement(measurement_id);
        let Some(measurement) = source.measurement(measurement_id) else {
            return Err(self.empty_source(kind, &[key]));
        };
        let entries = source.measurement_entries(measurement_id);
        if entries.is_empty() {
            return Err(self.empty_source(kind, &[key]));
        }

        let (unit_category, target_unit) = match measurement.measurement_type {
            MeasurementType::Caliper => (UnitCategory::Caliper, LengthUnit::Mm),
            MeasurementType::Circumference => (UnitCategory::Circumference, self.circumference_unit),
        };

        let charted = self.axis.charted_keys();
        let siblings = BTreeSet::from([key.clone()]);
        let mut load = PendingLoad::new(area_unit(as_area, unit_category));
        let mut seen = HashSet::new();
        for entry in &entries {
            let date = entry.date.date();
            if !seen.insert(date) {
                continue;
            }
            let values = entry.values();
            let Some(mv) = values.get(&measurement_id) else {
                continue;
            };
            if !(mv.value.is_finite() && mv.value > 0.0)
                || mv.measurement_type != measurement.measurement_type
            {
                continue;
            }
            let value = match (mv.measurement_type, mv.unit.parse::<LengthUnit>()) {
                (MeasurementType::Caliper, Ok(LengthUnit::Mm)) => round_two_decimals(mv.value),
                (MeasurementType::Circumference, Ok(unit)) => round_two_decimals(
                    self.units.convert(mv.value, unit.into(), target_unit.into()),
                ),
                _ => continue,
            };

            let date_key = self.formatter.format_date_key(date);
            let comments_loaded = any_sibling_loaded(
                &values
                    .keys()
                    .map(|id| CategoryKey::Measurement(*id))
                    .collect::<Vec<_>>(),
                &charted,
            );
            if !comments_loaded {
                self.queue_body_measurement_comment(
                    &mut load,
                    CommentedRecord::MeasurementEntry(entry.id),
                    entry.comment.as_deref(),
                    &date_key,
                    &siblings,
                );
            }
            load.rows
                .push(ChartRow::placeholder(date, &self.formatter).with_value(key.clone(), value));
        }

        load.series.push((
            key,
            SeriesMetadata {
                label: format!("{} [{unit_category}]", measurement.name),
                unit: target_unit.to_string(),
                unit_category,
            },
        ));
        self.commit(load)
    }

    /// Per-date stats of one exercise. Stats already loaded are skipped.
    pub fn load_exercise_stats(
        &mut self,
        source: &impl RecordSource,
        exercise_id: i64,
        stats: &BTreeSet<ExerciseStat>,
        area_unit_category: Option<UnitCategory>,
    ) -> Result<LoadOutcome, LoadError> {
        let pending_stats: BTreeSet<ExerciseStat> = stats
            .iter()
            .copied()
            .filter(|s| !self.already_loaded(&CategoryKey::exercise(*s, exercise_id)))
            .collect();
        if pending_stats.is_empty() {
            return Ok(LoadOutcome::AlreadyLoaded);
        }
        let keys: Vec<CategoryKey> = pending_stats
            .iter()
            .map(|s| CategoryKey::exercise(*s, exercise_id))
            .collect();

        let sets = source.completed_sets_for_exercise(exercise_id);
        if sets.is_empty() {
            return Err(self.empty_source(SourceKind::CompletedSets(exercise_id), &keys));
        }

        let name = source
            .exercise(exercise_id)
            .map(|e| e.name)
            .unwrap_or_else(|| format!("Exercise {exercise_id}"));

        let new_keys: BTreeSet<CategoryKey> = keys.iter().cloned().collect();
        let existing = self.axis.charted_keys().into_iter().find(|k| {
            matches!(k, CategoryKey::Exercise { exercise_id: id, .. } if *id == exercise_id)
        });
        let comments_loaded = existing.is_some();

        let mut load = PendingLoad::new(area_unit_category);
        load.comment_link = existing.map(|k| (k, new_keys.clone()));

        let mut by_date: BTreeMap<NaiveDate, Vec<CompletedSet>> = BTreeMap::new();
        for set in sets {
            by_date.entry(set.time_completed.date()).or_default().push(set);
        }

        let options = self.options.clone();
        for (date, day_sets) in &by_date {
            let analytics = analyze_set_list(day_sets, &pending_stats, &options, &self.units);
            if analytics.values.is_empty() {
                continue;
            }

            let mut row = ChartRow::placeholder(*date, &self.formatter);
            for (stat, value) in &analytics.values {
                row.values
                    .insert(CategoryKey::exercise(*stat, exercise_id), *value);
            }
            let date_key = row.date_key.clone();
            load.rows.push(row);

            if !comments_loaded {
                for (set_num, comment) in &analytics.set_comments {
                    let label = format!("{name} Set {set_num} Comment");
                    load.annotate(&date_key, &new_keys, &label, comment);
                }
                for comment in analytics.workout_comments.values() {
                    load.annotate(&date_key, &new_keys, WORKOUT_COMMENT, comment);
                }
            }
            if analytics.includes_multiset {
                load.multiset_dates.push(date_key);
            }
        }

        for stat in &pending_stats {
            load.series.push((
                CategoryKey::exercise(*stat, exercise_id),
                SeriesMetadata {
                    label: format!("{} [{name}]", stat.label()),
                    unit: stat_unit(*stat, &options),
                    unit_category: stat.unit_category(),
                },
            ));
        }
        self.commit(load)
    }

    /// Weighted set counts for muscle groups. Unknown tags are ignored.
    pub fn load_exercise_groups(
        &mut self,
        source: &impl RecordSource,
        groups: &[String],
        as_area: bool,
    ) -> Result<LoadOutcome, LoadError> {
        let mut selected: Vec<String> = Vec::new();
        let mut any_known = false;
        for group in groups {
            if !EXERCISE_GROUPS.contains_key(group.as_str()) {
                log::warn!("Unknown exercise group {group}");
                continue;
            }
            any_known = true;
            if !self.already_loaded(&CategoryKey::exercise_group(group)) && !selected.contains(group)
            {
                selected.push(group.clone());
            }
        }
        if selected.is_empty() {
            if any_known {
                return Ok(LoadOutcome::AlreadyLoaded);
            }
            return Err(LoadError::EmptySource {
                source: SourceKind::ExerciseGroups,
            });
        }

        let selection = GroupSelection {
            groups: selected,
            include_secondary: self.settings.include_secondary_groups,
            count_secondary_as_one: self.settings.count_secondary_as_one,
        };
        let keys: Vec<CategoryKey> = selection
            .groups
            .iter()
            .map(|g| CategoryKey::exercise_group(g))
            .collect();

        let memberships: Vec<_> = source.exercises().iter().map(|e| e.membership()).collect();
        let multipliers = exercise_multipliers(&memberships, &selection);
        self.disabled_groups.extend(selection.groups.iter().cloned());
        if multipliers.is_empty() {
            return Err(self.empty_source(SourceKind::ExerciseGroups, &keys));
        }

        let set_dates: BTreeMap<i64, Vec<NaiveDate>> = multipliers
            .keys()
            .map(|id| {
                let dates = source
                    .completed_sets_for_exercise(*id)
                    .iter()
                    .map(|s| s.time_completed.date())
                    .collect();
                (*id, dates)
            })
            .collect();

        let counts = aggregate_group_sets(&multipliers, &set_dates, &selection, &self.formatter);
        if !counts.empty_groups.is_empty() {
            log::debug!("Exercise groups without sets: {}", counts.empty_groups.join(", "));
        }

        let mut load = PendingLoad::new(area_unit(as_area, UnitCategory::NumberOfSets));
        load.rows = counts.rows;
        // Group series count weighted sets, not reps.
        for (group, key) in selection.groups.iter().zip(keys) {
            load.series.push((
                key,
                SeriesMetadata {
                    label: format!("Number Of {} Sets", group_display_name(group)),
                    unit: "sets".into(),
                    unit_category: UnitCategory::NumberOfSets,
                },
            ));
        }
        self.commit(load)
    }

    /// Re-express every series of the unit's category in `new_unit`.
    /// Returns `false` when nothing changed.
    pub fn change_unit(&mut self, new_unit: DisplayUnit) -> bool {
        let old_unit = match new_unit {
            DisplayUnit::Weight(u) => {
                DisplayUnit::Weight(std::mem::replace(&mut self.options.weight_unit, u))
            }
            DisplayUnit::Distance(u) => {
                DisplayUnit::Distance(std::mem::replace(&mut self.options.distance_unit, u))
            }
            DisplayUnit::Speed(u) => {
                DisplayUnit::Speed(std::mem::replace(&mut self.options.speed_unit, u))
            }
            DisplayUnit::Pace(u) => {
                DisplayUnit::Pace(std::mem::replace(&mut self.options.pace_unit, u))
            }
            DisplayUnit::Circumference(u) => {
                DisplayUnit::Circumference(std::mem::replace(&mut self.circumference_unit, u))
            }
        };
        if old_unit == new_unit {
            return false;
        }
        let unit_category = new_unit.unit_category();

        let keys: BTreeSet<CategoryKey> = self
            .metadata
            .iter()
            .filter(|(_, m)| m.unit_category == unit_category)
            .map(|(k, _)| k.clone())
            .collect();

        let units = &self.units;
        self.rows = convert_values(&self.rows, &keys, |v| units.convert(v, old_unit, new_unit));

        let maxima = max_values_in(&self.rows);
        for key in &keys {
            if let Some(meta) = self.metadata.get_mut(key) {
                meta.unit = new_unit.to_string();
            }
            self.tracker.reset_to(key, maxima.get(key).copied());
        }
        log::info!("Changed {unit_category} unit from {old_unit} to {new_unit}");
        true
    }

    /// Move a line series and every line series of its unit category to the
    /// area axis.
    pub fn move_series_to_area(&mut self, key: &CategoryKey) -> bool {
        let moved = self.axis.move_to_area(key);
        if moved {
            log::debug!("Moved {key} and its unit category to the area axis");
        }
        moved
    }

    /// Move an area series to the line axis. The last area series stays.
    pub fn move_series_to_line(&mut self, key: &CategoryKey) -> bool {
        let moved = self.axis.move_to_line(key);
        if moved {
            log::debug!("Moved {key} to the line axis");
        }
        moved
    }

    pub fn move_unit_category_to_area(&mut self, unit_category: UnitCategory) -> bool {
        self.axis.move_unit_category_to_area(unit_category)
    }

    pub fn set_shown_areas(&mut self, keys: &BTreeSet<CategoryKey>) {
        self.axis.set_shown_areas(keys);
    }

    pub fn set_shown_lines(&mut self, keys: &BTreeSet<CategoryKey>) {
        self.axis.set_shown_lines(keys);
    }

    pub fn set_date_filter(&mut self, min: Option<NaiveDate>, max: Option<NaiveDate>) {
        self.filter_min = min;
        self.filter_max = max;
    }

    pub fn date_filter(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (self.filter_min, self.filter_max)
    }

    fn is_filtered(&self) -> bool {
        self.filter_min.is_some() || self.filter_max.is_some()
    }

    /// Rows inside the date filter.
    pub fn filtered_rows(&self) -> Vec<ChartRow> {
        if !self.is_filtered() {
            return self.rows.clone();
        }
        filter_by_date_range(&self.rows, self.filter_min, self.filter_max)
    }

    /// Usable maxima, recomputed over the filtered rows when a filter is set.
    /// A series without values inside the filter gets `0`.
    pub fn filtered_maxima(&self) -> BTreeMap<CategoryKey, f64> {
        let usable = self.tracker.usable();
        if !self.is_filtered() {
            return usable;
        }
        let in_range = max_values_in(&self.filtered_rows());
        usable
            .into_keys()
            .map(|k| {
                let max = in_range.get(&k).copied().unwrap_or(0.0);
                (k, max)
            })
            .collect()
    }

    /// Add a reference area for `period`, clamped to the visible rows.
    pub fn add_time_period(&mut self, period: &TimePeriod, today: NaiveDate) -> bool {
        if self.reference_areas.contains(period.id) {
            return false;
        }
        let span = date_span(&self.filtered_rows());
        match ReferenceArea::from_time_period(period, span, today, &self.formatter) {
            Some(area) => self.reference_areas.add(area),
            None => false,
        }
    }

    pub fn toggle_reference_area<F>(&mut self, id: i64, factory: F)
    where
        F: FnOnce() -> ReferenceArea,
    {
        self.reference_areas.toggle_by_id(id, factory);
    }

    pub fn remove_reference_area(&mut self, id: i64) {
        self.reference_areas.remove(id);
    }

    pub fn show_reference_areas(&mut self, ids: &BTreeSet<i64>) {
        self.reference_areas.set_shown(ids);
    }

    /// Dispatch one request.
    pub fn apply(
        &mut self,
        source: &impl RecordSource,
        request: &LoadRequest,
        today: NaiveDate,
    ) -> Result<LoadOutcome, LoadError> {
        match request {
            LoadRequest::Diet { metric, as_area } => self.load_diet_metric(source, *metric, *as_area),
            LoadRequest::BodyWeight { as_area } => self.load_body_weight(source, *as_area),
            LoadRequest::BodyFat { as_area } => self.load_body_fat(source, *as_area),
            LoadRequest::Measurement {
                measurement_id,
                as_area,
            } => self.load_measurement(source, *measurement_id, *as_area),
            LoadRequest::ExerciseStats {
                exercise_id,
                stats,
                area_unit_category,
            } => self.load_exercise_stats(source, *exercise_id, stats, *area_unit_category),
            LoadRequest::ExerciseGroups { groups, as_area } => {
                self.load_exercise_groups(source, groups, *as_area)
            }
            LoadRequest::TimePeriod { time_period_id } => {
                let Some(period) = source.time_period(*time_period_id) else {
                    log::warn!("Unknown time period {time_period_id}");
                    return Ok(LoadOutcome::Unchanged);
                };
                Ok(applied(self.add_time_period(&period, today)))
            }
            LoadRequest::ChangeUnit {
                unit_category,
                unit,
            } => {
                let Some(unit) = DisplayUnit::parse(*unit_category, unit) else {
                    log::warn!("Cannot show {unit_category} series in {unit}");
                    return Ok(LoadOutcome::Unchanged);
                };
                Ok(applied(self.change_unit(unit)))
            }
            LoadRequest::DateFilter { min, max } => {
                self.set_date_filter(*min, *max);
                Ok(LoadOutcome::Applied)
            }
            LoadRequest::MoveToArea { key } => Ok(applied(self.move_series_to_area(key))),
            LoadRequest::MoveToLine { key } => Ok(applied(self.move_series_to_line(key))),
            LoadRequest::MoveUnitCategoryToArea { unit_category } => {
                Ok(applied(self.move_unit_category_to_area(*unit_category)))
            }
            LoadRequest::ShowAreas { keys } => {
                self.set_shown_areas(keys);
                Ok(LoadOutcome::Applied)
            }
            LoadRequest::ShowLines { keys } => {
                self.set_shown_lines(keys);
                Ok(LoadOutcome::Applied)
            }
        }
    }

    pub fn view(&self) -> ChartView {
        let maxima = self.filtered_maxima();
        ChartView {
            rows: self.filtered_rows(),
            area_keys: self.axis.ordered_area_keys(&maxima),
            line_keys: self.axis.line_keys().to_vec(),
            shown_area_keys: self.axis.shown_area_keys(),
            shown_line_keys: self.axis.shown_line_keys(),
            primary_unit_category: self.axis.primary_unit_category(),
            line_unit_categories: self.axis.line_unit_categories(),
            primary_domain_key: self.axis.primary_domain_key(&maxima),
            secondary_domain_key: self.axis.secondary_domain_key(&maxima),
            metadata: self.metadata.clone(),
            annotations: self.annotations.clone(),
            reference_areas: self.reference_areas.shown().into_iter().cloned().collect(),
            multiset_dates: self.multiset_dates.clone(),
            disabled_exercise_groups: self.disabled_groups.clone(),
            maxima,
        }
    }

    /// Drop everything loaded and start over with the configured units.
    pub fn reset(&mut self) {
        self.options = self.settings.set_analytics_options();
        self.circumference_unit = self.settings.circumference_unit;
        self.rows.clear();
        self.metadata.clear();
        self.tracker = MaxValueTracker::new();
        self.registry = LoadRegistry::new();
        self.annotations = AnnotationTable::new();
        self.axis = AxisAssigner::new();
        self.reference_areas.clear();
        self.commented_records.clear();
        self.multiset_dates.clear();
        self.disabled_groups.clear();
        self.filter_min = None;
        self.filter_max = None;
        log::info!("Analytics session reset");
    }
}
