use crate::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tempfile::NamedTempFile;
use tracing::info;

/// Create a temp file next to `path`, let `fill` write it, then rename it
/// over `path`. On any error the temp file is removed when dropped and the
/// previous `path` (if any) is left untouched.
fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut std::fs::File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    fill(tmp.as_file_mut())?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    info!(path = %path.display(), "written");
    Ok(())
}

pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, |f| {
        f.write_all(content.as_bytes())?;
        Ok(())
    })
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    write_atomic(path, |f| {
        let mut wtr = csv::Writer::from_writer(f);
        for r in rows {
            wtr.serialize(r)?;
        }
        wtr.flush()?;
        Ok(())
    })
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    write_text(path, &s)
}

/// Print a titled markdown table of the first `max_rows` rows.
pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::aggregate::tests::sample;
    use crate::error::ReportError;
    use crate::types::Dimension;
    use std::fs;

    #[test]
    fn csv_export_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("centers.csv");
        let rows = aggregate(&sample(), Dimension::ServiceCenter);
        write_csv(&path, &rows).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("key,category,quantity,amount,pre_tax_amount,avg_unit_price")
        );
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn overwrite_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        write_text(&path, "old").unwrap();
        write_text(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_text(&path, "{}").unwrap();
        let err = write_atomic(&path, |_| Err(ReportError::NoTransactions)).unwrap_err();
        assert!(matches!(err, ReportError::NoTransactions));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("report.html");
        assert!(matches!(write_text(&path, "x"), Err(ReportError::Io(_))));
    }
}
