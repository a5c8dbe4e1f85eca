use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::CliError;

/// `data/activation_load.csv` -> `data/activation_load.report.json`.
pub fn report_path_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "activation_load".to_string());
    output.with_file_name(format!("{stem}.report.json"))
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let data = serde_json::to_vec_pretty(value)?;
    write_bytes_atomic(path, &data)
}

/// Write through a uniquely named sibling temp file and rename, so readers
/// never see a partial file and concurrent runs never share a temp file.
/// The temp file is removed when any step fails.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<(), CliError> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let written = write_and_rename(&tmp_path, path, data);
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    written?;
    if let Some(parent) = parent {
        sync_dir(parent)?;
    }
    Ok(())
}

fn write_and_rename(tmp_path: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    std::fs::rename(tmp_path, path)
}

/// `report.json` -> `.report.json.<uuid>.tmp` in the same directory.
fn temp_path(path: &Path) -> Result<PathBuf, CliError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::InvalidConfig(format!("not a file path: {}", path.display())))?;
    Ok(path.with_file_name(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        Uuid::new_v4().simple()
    )))
}

fn sync_dir(path: &Path) -> io::Result<()> {
    OpenOptions::new().read(true).open(path)?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_sits_next_to_output() {
        assert_eq!(
            report_path_for(Path::new("data/activation_load.csv")),
            PathBuf::from("data/activation_load.report.json")
        );
        assert_eq!(
            report_path_for(Path::new("out")),
            PathBuf::from("out.report.json")
        );
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = std::env::temp_dir().join(format!("synthload_artifacts_{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("report.json");

        write_bytes_atomic(&path, b"first").expect("first write");
        write_json_atomic(&path, &serde_json::json!({"saved": 3})).expect("second write");

        let text = std::fs::read_to_string(&path).expect("read back");
        assert!(text.contains("\"saved\": 3"));

        let entries: Vec<String> = std::fs::read_dir(dir.join("nested"))
            .expect("list dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["report.json".to_string()]);
    }

    #[test]
    fn temp_files_are_unique_and_hidden() {
        let path = Path::new("data/activation_load.report.json");
        let first = temp_path(path).expect("temp path");
        let second = temp_path(path).expect("temp path");
        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
        let name = first.file_name().expect("name").to_string_lossy().into_owned();
        assert!(name.starts_with(".activation_load.report.json."));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = std::env::temp_dir().join(format!("synthload_artifacts_{}", uuid::Uuid::new_v4()));
        let target = dir.join("occupied");
        std::fs::create_dir_all(target.join("child")).expect("non-empty dir");

        assert!(write_bytes_atomic(&target, b"data").is_err());
        let leftovers = std::fs::read_dir(&dir)
            .expect("list dir")
            .filter(|entry| {
                entry
                    .as_ref()
                    .map(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(leftovers, 0);
    }
}
