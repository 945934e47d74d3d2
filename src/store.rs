//! JSON snapshot persistence.
//!
//! The snapshot is a single pretty-printed JSON array of vacancies. It is
//! always loaded and written wholesale.

use crate::models::Vacancy;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read snapshot {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {} is not a valid vacancy list: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize vacancies: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write snapshot {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load a snapshot from disk.
pub fn load(path: &Path) -> Result<Vec<Vacancy>, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let vacancies: Vec<Vacancy> =
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    info!("Loaded {} vacancies from {}", vacancies.len(), path.display());
    Ok(vacancies)
}

/// Render vacancies as 4-space indented JSON without ASCII escaping.
pub fn to_pretty_json(vacancies: &[Vacancy]) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    vacancies.serialize(&mut serializer)?;
    Ok(buf)
}

/// Write a snapshot, replacing any existing file atomically.
pub fn save(path: &Path, vacancies: &[Vacancy]) -> Result<(), StoreError> {
    let content = to_pretty_json(vacancies)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&content).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    info!("Saved {} vacancies to {}", vacancies.len(), path.display());
    Ok(())
}

/// Modification time of the snapshot, if it can be determined.
pub fn snapshot_time(path: &Path) -> Option<DateTime<Local>> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Salary;
    use tempfile::TempDir;

    fn sample() -> Vec<Vacancy> {
        vec![Vacancy {
            id: "1".to_string(),
            title: "Инженер по защите информации".to_string(),
            salary: Some(Salary {
                from: Some(150_000.0),
                to: None,
                currency: Some("RUR".to_string()),
            }),
            key_skills: vec!["DLP".to_string()],
            url: Some("https://hh.ru/vacancy/1".to_string()),
        }]
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vacancies.json");

        save(&path, &sample()).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, sample());
        assert!(snapshot_time(&path).is_some());
    }

    #[test]
    fn test_pretty_json_keeps_unicode_and_indent() {
        let json = String::from_utf8(to_pretty_json(&sample()).unwrap()).unwrap();

        assert!(json.contains("Инженер по защите информации"));
        assert!(json.contains("\n    {\n        \"id\": \"1\""));
        assert!(json.contains("\"to\": null"));
    }

    #[test]
    fn test_whole_salaries_written_as_integers() {
        let mut vacancies = sample();
        vacancies[0].salary = Some(Salary {
            from: Some(150_000.0),
            to: Some(180_000.5),
            currency: Some("RUR".to_string()),
        });

        let json = String::from_utf8(to_pretty_json(&vacancies).unwrap()).unwrap();

        assert!(json.contains("\"from\": 150000,"));
        assert!(json.contains("\"to\": 180000.5"));
        assert!(!json.contains("150000.0"));

        let reparsed: Vec<Vacancy> = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed, vacancies);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vacancies.json");

        save(&path, &sample()).unwrap();
        save(&path, &[]).unwrap();

        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("absent.json")).unwrap_err();

        assert!(matches!(err, StoreError::Read { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"not\": \"a list\"}").unwrap();

        assert!(matches!(load(&path).unwrap_err(), StoreError::Parse { .. }));
    }
}
