//! JSON file helpers shared by the cache, rewrite and group stores.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::Builder;

use crate::error::{Error, Result};

/// Read and parse a JSON file. A missing file yields `None`; a file that
/// exists but does not parse is an error.
pub(crate) fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(path, e)),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::parse(path, e))
}

/// Serialize `value` to `path`, replacing any previous file. The data is
/// written to a sibling temp file first and renamed into place.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = Builder::new()
        .prefix(".memberatlas-")
        .tempfile_in(dir)
        .map_err(|e| Error::io(dir, e))?;

    serde_json::to_writer_pretty(&mut tmp, value).map_err(|source| Error::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.write_all(b"\n").map_err(|e| Error::io(path, e))?;
    tmp.flush().map_err(|e| Error::io(path, e))?;

    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let value: Option<BTreeMap<String, String>> =
            read_json_if_exists(&dir.path().join("absent.json")).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_json_if_exists::<BTreeMap<String, String>>(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_write_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "old contents").unwrap();

        let mut map = BTreeMap::new();
        map.insert("k".to_string(), "v".to_string());
        write_json(&path, &map).unwrap();

        let back: BTreeMap<String, String> = read_json_if_exists(&path).unwrap().unwrap();
        assert_eq!(back, map);
    }
}
