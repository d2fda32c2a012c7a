use crate::api::ChatTransport;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Model name to API key, persisted as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeyStore {
    path: PathBuf,
    keys: BTreeMap<String, String>,
}

impl ApiKeyStore {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keys: BTreeMap::new(),
        }
    }

    /// A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::empty(path));
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read API keys from {}", path.display()))?;
        let keys: BTreeMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("invalid API key file {}", path.display()))?;
        Ok(Self { path, keys })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.keys)?;
        let temp_path = self.path.with_extension("json.tmp");
        write_owner_only(&temp_path, json.as_bytes())
            .with_context(|| format!("failed to write {}", temp_path.display()))?;
        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }

    pub fn set(&mut self, model: impl Into<String>, key: impl Into<String>) {
        self.keys.insert(model.into(), key.into());
    }

    pub fn get(&self, model: &str) -> Option<&str> {
        self.keys.get(model).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys.iter().map(|(m, k)| (m.as_str(), k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySyncReport {
    pub pushed: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

impl KeySyncReport {
    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("API keys synced: {}", self.pushed.len())
        } else {
            format!(
                "API keys synced: {}, failed: {}",
                self.pushed.len(),
                self.failed.join(", ")
            )
        }
    }
}

/// Pushes one key. Failures are logged and reported as `false`.
pub async fn push_api_key(transport: &dyn ChatTransport, model: &str, key: &str) -> bool {
    match transport.save_api_key(model, key).await {
        Ok(true) => {
            tracing::info!(model, "API key pushed to backend");
            true
        }
        Ok(false) => {
            tracing::warn!(model, "backend refused API key");
            false
        }
        Err(error) => {
            tracing::warn!(model, %error, "failed to push API key");
            false
        }
    }
}

/// Pushes every stored key with a non-empty value, one request per model.
pub async fn sync_api_keys(transport: &dyn ChatTransport, store: &ApiKeyStore) -> KeySyncReport {
    let mut report = KeySyncReport::default();
    for (model, key) in store.entries() {
        if key.trim().is_empty() {
            report.skipped.push(model.to_string());
            continue;
        }
        if push_api_key(transport, model, key).await {
            report.pushed.push(model.to_string());
        } else {
            report.failed.push(model.to_string());
        }
    }
    report
}

/// Creates or truncates `path`, readable by the owner only on unix.
fn write_owner_only(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies on creation; a stale temp file keeps its old bits.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_client::MockTransport;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ApiKeyStore::load(dir.path().join("nope.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_then_load_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("api_keys.json");
        let mut store = ApiKeyStore::empty(&path);
        store.set("openai", "sk-1");
        store.set("anthropic", "sk-2");
        store.save().unwrap();

        let loaded = ApiKeyStore::load(&path).unwrap();
        assert_eq!(loaded.get("openai"), Some("sk-1"));
        assert_eq!(loaded.len(), 2);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_keys.json");
        std::fs::write(path.with_extension("json.tmp"), "{}").unwrap();
        std::fs::set_permissions(
            path.with_extension("json.tmp"),
            std::fs::Permissions::from_mode(0o644),
        )
        .unwrap();

        let mut store = ApiKeyStore::empty(&path);
        store.set("openai", "sk-1");
        store.save().unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_keys.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(ApiKeyStore::load(&path).is_err());
    }

    #[tokio::test]
    async fn test_sync_pushes_only_non_empty_keys() {
        let transport = MockTransport::new();
        let mut store = ApiKeyStore::empty("/unused");
        store.set("openai", "sk-1");
        store.set("gemini", "   ");
        store.set("anthropic", "");

        let report = sync_api_keys(&transport, &store).await;

        assert_eq!(report.pushed, vec!["openai".to_string()]);
        assert_eq!(report.skipped, vec!["anthropic".to_string(), "gemini".to_string()]);
        assert_eq!(
            transport.saved_keys(),
            vec![("openai".to_string(), "sk-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_sync_failure_is_absorbed() {
        let transport = MockTransport::new();
        transport.reject_key_for("openai");
        let mut store = ApiKeyStore::empty("/unused");
        store.set("openai", "sk-1");
        store.set("zeta", "sk-2");

        let report = sync_api_keys(&transport, &store).await;

        assert_eq!(report.failed, vec!["openai".to_string()]);
        assert_eq!(report.pushed, vec!["zeta".to_string()]);
        assert!(report.summary().contains("failed: openai"));
    }
}
