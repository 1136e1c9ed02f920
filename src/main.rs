// Replay chart requests against a JSON dataset and export the chart
use chrono::Local;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use workout_chart_analytics::export::{save_chart_csv, save_view_json};
use workout_chart_analytics::{
    AnalyticsSession, AnalyticsSettings, InMemorySource, LoadOutcome, LoadRequest,
};

#[derive(Debug, Deserialize)]
struct Dataset {
    /// Falls back to the settings file in the config directory.
    #[serde(default)]
    settings: Option<AnalyticsSettings>,
    /// Store the dataset's settings as the new defaults.
    #[serde(default)]
    save_settings: bool,
    #[serde(flatten)]
    records: InMemorySource,
    #[serde(default)]
    requests: Vec<LoadRequest>,
}

fn run(dataset_path: &Path, out_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read_to_string(dataset_path)?;
    let dataset: Dataset = serde_json::from_str(&data)?;
    let settings = match dataset.settings {
        Some(settings) => {
            if dataset.save_settings {
                settings.save();
            }
            settings
        }
        None => AnalyticsSettings::load(),
    };
    let today = Local::now().date_naive();

    let mut session = AnalyticsSession::new(settings);
    for request in &dataset.requests {
        match session.apply(&dataset.records, request, today) {
            Ok(LoadOutcome::Loaded(keys)) => log::debug!("{request:?} charted {} series", keys.len()),
            Ok(outcome) => log::debug!("{request:?}: {outcome:?}"),
            Err(e) => log::warn!("{e}"),
        }
    }

    std::fs::create_dir_all(out_dir)?;
    let view = session.view();
    save_chart_csv(out_dir.join("chart.csv"), &view.rows)?;
    save_view_json(out_dir.join("chart.json"), &view)?;
    log::info!(
        "Exported {} rows and {} series to {}",
        view.rows.len(),
        view.metadata.len(),
        out_dir.display()
    );
    Ok(())
}

fn main() {
    env_logger::init();

    let mut args = std::env::args_os().skip(1);
    let Some(dataset_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: workout-chart-analytics <dataset.json> [out_dir]");
        std::process::exit(2);
    };
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    if let Err(e) = run(&dataset_path, &out_dir) {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;
    use workout_chart_analytics::WeightUnit;

    static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn dataset_requests_are_exported() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("dataset.json");
        std::fs::write(
            &dataset,
            r#"{
                "settings": {"locale": "sv-SE"},
                "diet_logs": [
                    {"date": "2025-01-01", "calories": 2100, "protein": 150},
                    {"date": "2025-01-03", "calories": 1900, "protein": 140}
                ],
                "requests": [
                    {"kind": "diet", "metric": "calories", "as_area": true},
                    {"kind": "diet", "metric": "protein"},
                    {"kind": "body_weight"}
                ]
            }"#,
        )
        .unwrap();

        let out = dir.path().join("out");
        run(&dataset, &out).unwrap();

        let csv = std::fs::read_to_string(out.join("chart.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,calories,protein");
        assert_eq!(lines[2], "2025-01-02,,");
        assert_eq!(lines.len(), 4);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("chart.json")).unwrap())
                .unwrap();
        assert_eq!(json["primary_domain_key"], "calories");
        assert_eq!(json["secondary_domain_key"], "protein");
    }

    #[test]
    fn malformed_dataset_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("dataset.json");
        std::fs::write(&dataset, "[1, 2").unwrap();
        assert!(run(&dataset, dir.path()).is_err());
    }

    #[test]
    fn dataset_settings_can_become_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let prev_config = std::env::var_os("XDG_CONFIG_HOME");
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", dir.path().join("config"));
        }

        let dataset = dir.path().join("dataset.json");
        std::fs::write(
            &dataset,
            r#"{"settings": {"weight_unit": "lbs"}, "save_settings": true}"#,
        )
        .unwrap();
        run(&dataset, &dir.path().join("out")).unwrap();
        assert_eq!(AnalyticsSettings::load().weight_unit, WeightUnit::Lbs);

        match prev_config {
            Some(val) => unsafe { std::env::set_var("XDG_CONFIG_HOME", val) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
    }
}
