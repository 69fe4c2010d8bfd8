use std::sync::Arc;

use tracing::info;

use crate::{
    config::PlayerConfig,
    error::Result,
    script::{LoadedScript, ScriptSource},
    timeline::PageTimeline,
};

/// A loaded script together with the page timeline built from it.
#[derive(Debug, Clone)]
pub struct Deck {
    pub source: ScriptSource,
    pub loaded: LoadedScript,
    pub timeline: Arc<PageTimeline>,
}

impl Deck {
    /// Resolve `identifier` against the configured scripts directory, load
    /// and validate it, then lay out its pages.
    pub async fn open(identifier: &str, config: &PlayerConfig) -> Result<Self> {
        let source = ScriptSource::resolve(identifier, &config.paths.scripts_dir);
        let loaded = source.load().await?;
        let timeline = PageTimeline::from_loaded(&loaded, &config.paths.audio_dir, &config.durations);

        info!(
            script = %loaded.id,
            pages = timeline.len(),
            warnings = loaded.report.warnings.len(),
            total_secs = timeline.total_duration().as_secs_f64(),
            "deck opened"
        );

        Ok(Self {
            source,
            loaded,
            timeline: Arc::new(timeline),
        })
    }

    pub fn id(&self) -> &str {
        &self.loaded.id
    }
}
