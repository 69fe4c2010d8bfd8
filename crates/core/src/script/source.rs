use std::path::{Path, PathBuf};

use reqwest::Url;
use thiserror::Error;
use tracing::{debug, warn};

use crate::script::{Script, ValidationReport, Violation, validate};

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to fetch script {url}: {source}")]
    Fetch { url: Url, source: reqwest::Error },

    #[error("Failed to parse scripts index {path}: {source}")]
    Index {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Script is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Script failed validation with {} error(s):\n{}", .violations.len(), format_violations(.violations))]
    Invalid { violations: Vec<Violation> },
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Where a script document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    File(PathBuf),
    Remote(Url),
}

/// A parsed, validated script plus the identifier used for audio and artifact names.
#[derive(Debug, Clone)]
pub struct LoadedScript {
    pub id: String,
    pub script: Script,
    pub report: ValidationReport,
}

impl ScriptSource {
    /// Resolve a user-supplied identifier: a URL, a path, or a bare script
    /// name looked up in `scripts_dir`.
    pub fn resolve(identifier: &str, scripts_dir: &Path) -> Self {
        if (identifier.starts_with("http://") || identifier.starts_with("https://"))
            && let Ok(url) = Url::parse(identifier)
        {
            return ScriptSource::Remote(url);
        }

        let path = Path::new(identifier);
        if path.extension().is_some() || path.components().count() > 1 {
            ScriptSource::File(path.to_path_buf())
        } else {
            ScriptSource::File(scripts_dir.join(format!("{identifier}.json")))
        }
    }

    pub fn script_id(&self) -> String {
        let stem = match self {
            ScriptSource::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned()),
            ScriptSource::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(|s| s.trim_end_matches(".json").to_string()),
        };
        stem.unwrap_or_else(|| "script".to_string())
    }

    async fn fetch_text(&self) -> Result<String, ScriptError> {
        match self {
            ScriptSource::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ScriptError::Read {
                        path: path.clone(),
                        source,
                    })
            }
            ScriptSource::Remote(url) => {
                let fetch = async {
                    let response = reqwest::get(url.clone()).await?.error_for_status()?;
                    Ok::<_, reqwest::Error>(response.text().await?)
                };
                fetch.await.map_err(|source| ScriptError::Fetch {
                    url: url.clone(),
                    source,
                })
            }
        }
    }

    pub async fn load(&self) -> Result<LoadedScript, ScriptError> {
        debug!(source = ?self, "loading script");
        let text = self.fetch_text().await?;
        let (script, report) = parse_script(&text)?;
        Ok(LoadedScript {
            id: self.script_id(),
            script,
            report,
        })
    }
}

/// Parse and validate script JSON. Any validation error rejects the whole
/// document; warnings are logged and returned alongside the script.
pub fn parse_script(text: &str) -> Result<(Script, ValidationReport), ScriptError> {
    let doc: serde_json::Value = serde_json::from_str(text)?;
    let report = validate(&doc);

    if !report.is_valid() {
        return Err(ScriptError::Invalid {
            violations: report.errors,
        });
    }

    for warning in &report.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }

    let script = serde_json::from_value(doc)?;
    Ok((script, report))
}
