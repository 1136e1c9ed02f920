use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use crate::category::CategoryKey;
use crate::chart_data::ChartRow;
use crate::session::ChartView;

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

/// Write the chart table with one column per category. Days without a value
/// for a category get an empty cell.
pub fn write_chart_csv(writer: impl Write, rows: &[ChartRow]) -> csv::Result<()> {
    let keys: BTreeSet<&CategoryKey> = rows.iter().flat_map(|r| r.values.keys()).collect();

    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["date".to_string()];
    header.extend(keys.iter().map(|k| k.to_string()));
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.date_key.clone()];
        record.extend(
            keys.iter()
                .map(|k| row.get(k).map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(Into::into)
}

pub fn save_chart_csv<P: AsRef<Path>>(path: P, rows: &[ChartRow]) -> csv::Result<()> {
    write_chart_csv(std::fs::File::create(path)?, rows)
}

pub fn save_view_json<P: AsRef<Path>>(path: P, view: &ChartView) -> std::io::Result<()> {
    write_json(view, path)
}
