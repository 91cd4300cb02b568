// ── File-backed store ──
//
// One JSON object on disk mapping keys to UTF-8 values. Every write
// rewrites the whole document through a sibling temp file and a rename,
// so a crash leaves either the old or the new document.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use tracing::debug;

use super::{ListStore, StoreError};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, reading the existing document if present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = values.len(), "opened file store");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(values)?;
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&body)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `edit` to a copy of the document and commit it only if the
    /// write succeeds.
    fn update(
        &self,
        edit: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = values.clone();
        edit(&mut next);
        self.write_document(&next)?;
        *values = next;
        Ok(())
    }
}

impl ListStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).map(|v| Bytes::from(v.clone())))
    }

    fn put(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        let text = String::from_utf8(value.to_vec()).map_err(|_| StoreError::Encoding {
            key: key.to_owned(),
        })?;
        self.update(|values| {
            values.insert(key.to_owned(), text);
        })
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("gate.json")).unwrap();
        assert!(store.get("allow").unwrap().is_none());
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("gate.json");

        let store = FileStore::open(&path).unwrap();
        store
            .put("allow", Bytes::from_static(b"AA:BB:CC:DD:EE:FF"))
            .unwrap();
        store
            .put("alias/AA:BB:CC:DD:EE:FF", Bytes::from_static(b"kitchen"))
            .unwrap();
        store.delete("alias/AA:BB:CC:DD:EE:FF").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("allow").unwrap().unwrap(),
            Bytes::from_static(b"AA:BB:CC:DD:EE:FF")
        );
        assert!(reopened.get("alias/AA:BB:CC:DD:EE:FF").unwrap().is_none());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn non_utf8_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("gate.json")).unwrap();
        let err = store
            .put("alias/x", Bytes::from_static(&[0xff, 0xfe]))
            .unwrap_err();
        assert!(matches!(err, StoreError::Encoding { .. }));
        assert!(store.get("alias/x").unwrap().is_none());
    }

    #[test]
    fn malformed_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Json(_))));
    }
}
