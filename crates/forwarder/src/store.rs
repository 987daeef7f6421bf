//! 필터 문자열 저장소
//!
//! 런타임에 바뀐 필터 문자열을 재시작 후에도 복원할 수 있도록 보관합니다.
//! 파일 저장은 임시 파일에 쓴 뒤 이름을 바꾸므로, 중간에 중단되어도
//! 이전 내용이나 새 내용 중 하나만 남습니다.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use sysfwd_core::error::StoreError;
use sysfwd_core::pipeline::FilterStore;

/// 파일 기반 필터 저장소
#[derive(Debug, Clone)]
pub struct FileFilterStore {
    path: PathBuf,
    name: String,
}

impl FileFilterStore {
    /// 주어진 경로를 쓰는 저장소를 생성합니다. 파일은 첫 저장 때 만들어집니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }

    /// 저장 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }

    fn write_error(&self, reason: impl ToString) -> StoreError {
        StoreError::Write {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FilterStore for FileFilterStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content.trim_end_matches(['\r', '\n']).to_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Read {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn save(&self, filter_string: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }
        let temp = self.temp_path();
        std::fs::write(&temp, filter_string).map_err(|e| self.write_error(e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| self.write_error(e))?;
        Ok(())
    }
}

/// 메모리 기반 필터 저장소
#[derive(Debug, Default)]
pub struct MemoryFilterStore {
    value: Mutex<Option<String>>,
    saves: Mutex<usize>,
}

impl MemoryFilterStore {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 값이 미리 저장된 저장소를 생성합니다.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
            saves: Mutex::new(0),
        }
    }

    /// 현재 저장된 값
    pub fn value(&self) -> Option<String> {
        self.value.lock().clone()
    }

    /// `save` 호출 횟수
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl FilterStore for MemoryFilterStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.value())
    }

    fn save(&self, filter_string: &str) -> Result<(), StoreError> {
        *self.value.lock() = Some(filter_string.to_owned());
        *self.saves.lock() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFilterStore::new(dir.path().join("filters"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFilterStore::new(dir.path().join("filters"));
        store.save("sensor,wifi").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("sensor,wifi"));
        // 임시 파일은 남지 않아야 함
        assert!(!dir.path().join("filters.tmp").exists());
    }

    #[test]
    fn file_store_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFilterStore::new(dir.path().join("filters"));
        store.save("a,b,c").unwrap();
        store.save("").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some(""));
    }

    #[test]
    fn file_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("sysfwd").join("filters");
        let store = FileFilterStore::new(&path);
        store.save("api").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn file_store_trims_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters");
        std::fs::write(&path, "api,ota\n").unwrap();
        let store = FileFilterStore::new(&path);
        assert_eq!(store.load().unwrap().as_deref(), Some("api,ota"));
    }

    #[test]
    fn file_store_read_error_on_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFilterStore::new(dir.path());
        assert!(matches!(store.load(), Err(StoreError::Read { .. })));
    }

    #[test]
    fn memory_store_counts_saves() {
        let store = MemoryFilterStore::with_value("x");
        assert_eq!(store.load().unwrap().as_deref(), Some("x"));
        store.save("y").unwrap();
        assert_eq!(store.value().as_deref(), Some("y"));
        assert_eq!(store.save_count(), 1);
    }
}
