use crate::domain::Report;
use anyhow::Context;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "dst_";
const FILE_SUFFIX: &str = ".json";

pub fn report_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{FILE_PREFIX}{}{FILE_SUFFIX}", date.format("%Y-%m-%d")))
}

/// Writes the report as pretty JSON, replacing any earlier report for the same date.
pub async fn save_report(dir: &Path, report: &Report) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create logs dir {} failed", dir.display()))?;

    let path = report_path(dir, report.date);
    let body = serde_json::to_vec_pretty(report).context("serialize report failed")?;
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("write {} failed", path.display()))?;

    tracing::info!(path = %path.display(), run_id = %report.run_id, "report persisted");
    Ok(path)
}

/// `Ok(None)` when no report exists for `date`.
pub async fn load_report(dir: &Path, date: NaiveDate) -> anyhow::Result<Option<Report>> {
    let path = report_path(dir, date);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("read {} failed", path.display()));
        }
    };

    let report = serde_json::from_slice::<Report>(&bytes)
        .with_context(|| format!("decode {} failed", path.display()))?;
    Ok(Some(report))
}

/// Loads the report with the greatest date in `dir`. Files not named `dst_<date>.json` are
/// ignored.
pub async fn load_latest(dir: &Path) -> anyhow::Result<Option<Report>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("list {} failed", dir.display()));
        }
    };

    let mut latest: Option<NaiveDate> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("list {} failed", dir.display()))?
    {
        let name = entry.file_name();
        let Some(date) = name.to_str().and_then(date_from_file_name) else {
            continue;
        };
        if latest.map_or(true, |cur| date > cur) {
            latest = Some(date);
        }
    }

    match latest {
        Some(date) => load_report(dir, date).await,
        None => Ok(None),
    }
}

fn date_from_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}
