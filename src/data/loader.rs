use crate::data::bar::{normalize_series, Bar};
use crate::data::Granularity;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::{ReaderBuilder, Writer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize)]
struct CsvRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

//loads bars from a csv file written by save_csv (or any file with the same header)
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let mut bars = Vec::new();

    for (index, result) in reader.deserialize().enumerate() {
        let record: CsvRecord =
            result.context(format!("Failed to parse CSV record at line {}", index + 2))?;

        let timestamp = DateTime::parse_from_rfc3339(&record.timestamp)
            .context(format!(
                "Failed to parse timestamp '{}' at line {}",
                record.timestamp,
                index + 2
            ))?
            .with_timezone(&Utc);

        let bar = Bar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        )
        .context(format!("Invalid bar at line {}", index + 2))?;

        bars.push(bar);
    }

    //chronological order, one bar per timestamp
    normalize_series(&mut bars);

    Ok(bars)
}

//writes bars to a csv file, creating parent directories as needed
pub fn save_csv<P: AsRef<Path>>(bars: &[Bar], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory {:?}", parent))?;
        }
    }

    let mut writer =
        Writer::from_path(path).context(format!("Failed to create CSV file: {:?}", path))?;

    for bar in bars {
        writer.serialize(CsvRecord {
            timestamp: bar.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })?;
    }

    writer.flush()?;
    Ok(())
}

//cache file name for a download, eg data/EUR_USD_H1_2024-01-01_2024-02-01.csv
pub fn cache_path(
    data_dir: &Path,
    instrument: &str,
    granularity: Granularity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> PathBuf {
    data_dir.join(format!(
        "{}_{}_{}_{}.csv",
        instrument,
        granularity,
        start.date_naive(),
        end.date_naive()
    ))
}
