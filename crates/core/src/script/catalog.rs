use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::script::{ScriptError, ScriptSource};

const INDEX_FILE: &str = "index.json";

/// `index.json` in a scripts directory: the scripts offered for selection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptsIndex {
    #[serde(default)]
    pub files: Vec<String>,
}

/// One selectable script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub path: PathBuf,
}

fn entry_for(scripts_dir: &Path, file: &str) -> Option<CatalogEntry> {
    let file = file.trim();
    if file.is_empty() || file == INDEX_FILE {
        return None;
    }
    let name = file.strip_suffix(".json").unwrap_or(file);
    Some(CatalogEntry {
        name: name.to_string(),
        path: scripts_dir.join(format!("{name}.json")),
    })
}

impl ScriptSource {
    /// Scripts available in `scripts_dir`. The order of `index.json` is kept
    /// when it exists; otherwise every `*.json` file is listed by name.
    pub async fn list(scripts_dir: &Path) -> Result<Vec<CatalogEntry>, ScriptError> {
        let index_path = scripts_dir.join(INDEX_FILE);
        if tokio::fs::try_exists(&index_path).await.unwrap_or(false) {
            let text = tokio::fs::read_to_string(&index_path)
                .await
                .map_err(|source| ScriptError::Read {
                    path: index_path.clone(),
                    source,
                })?;
            let index: ScriptsIndex =
                serde_json::from_str(&text).map_err(|source| ScriptError::Index {
                    path: index_path.clone(),
                    source,
                })?;
            debug!(path = %index_path.display(), count = index.files.len(), "scripts index loaded");
            return Ok(index
                .files
                .iter()
                .filter_map(|file| entry_for(scripts_dir, file))
                .collect());
        }

        let read_err = |source| ScriptError::Read {
            path: scripts_dir.to_path_buf(),
            source,
        };
        let mut dir = tokio::fs::read_dir(scripts_dir).await.map_err(read_err)?;
        let mut entries = Vec::new();
        while let Some(item) = dir.next_entry().await.map_err(read_err)? {
            let file_name = item.file_name().to_string_lossy().into_owned();
            if !file_name.ends_with(".json") {
                continue;
            }
            if let Some(entry) = entry_for(scripts_dir, &file_name) {
                entries.push(entry);
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
