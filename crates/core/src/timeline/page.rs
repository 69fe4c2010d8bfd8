use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::{
    script::{AmbientEffect, Layout, LoadedScript, Script, Section},
    timeline::{DurationPolicy, DurationSource, effective_duration},
};

/// Conventional location of a pre-rendered narration clip.
pub fn conventional_audio_path(
    audio_root: &Path,
    script_id: &str,
    section_id: &str,
    content_index: usize,
) -> PathBuf {
    audio_root
        .join(script_id)
        .join(format!("{section_id}-{content_index:02}.wav"))
}

#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    pub section: Arc<Section>,
    pub narration: String,
    pub duration: Duration,
    pub duration_source: DurationSource,
    pub audio_file: PathBuf,
    /// Whether `audio_file` was named by the script rather than derived
    pub audio_declared: bool,
}

impl Page {
    /// 1-based page number, as reported to automation
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn section_id(&self) -> &str {
        &self.section.id
    }

    pub fn layout(&self) -> Layout {
        self.section.layout
    }

    /// No narration text and no clip named by the script. The page timer
    /// alone decides when a silent page ends.
    pub fn is_silent(&self) -> bool {
        self.narration.trim().is_empty() && !self.audio_declared
    }

    /// Ambient background for this page. Clean-capture sessions draw none.
    pub fn ambient(&self, clean_capture: bool) -> AmbientEffect {
        if clean_capture {
            AmbientEffect::None
        } else {
            self.layout().ambient_effect()
        }
    }
}

/// Ordered pages derived from a script. Built once per loaded script.
#[derive(Debug, Clone)]
pub struct PageTimeline {
    script_id: String,
    title: String,
    language: String,
    pages: Vec<Page>,
}

impl PageTimeline {
    pub fn build(
        script: &Script,
        script_id: &str,
        audio_root: &Path,
        policy: &DurationPolicy,
    ) -> Self {
        let pages = script
            .sections
            .iter()
            .enumerate()
            .map(|(index, section)| {
                let (duration, duration_source) = effective_duration(section, policy);
                let declared = section
                    .content
                    .iter()
                    .find_map(|item| item.audio_file.as_deref())
                    .filter(|file| !file.trim().is_empty());

                let (audio_file, audio_declared) = match declared {
                    Some(file) => (resolve_declared_audio(audio_root, file), true),
                    None => (
                        conventional_audio_path(audio_root, script_id, &section.id, 0),
                        false,
                    ),
                };

                Page {
                    index,
                    section: Arc::new(section.clone()),
                    narration: section.narration().to_string(),
                    duration,
                    duration_source,
                    audio_file,
                    audio_declared,
                }
            })
            .collect();

        Self {
            script_id: script_id.to_string(),
            title: script.title.clone(),
            language: script.language.clone(),
            pages,
        }
    }

    pub fn from_loaded(loaded: &LoadedScript, audio_root: &Path, policy: &DurationPolicy) -> Self {
        Self::build(&loaded.script, &loaded.id, audio_root, policy)
    }

    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Sum of page durations, saturating at `Duration::MAX`.
    pub fn total_duration(&self) -> Duration {
        self.pages
            .iter()
            .fold(Duration::ZERO, |total, p| total.saturating_add(p.duration))
    }
}

// Declared paths are web paths such as `/tts/clip.wav`, where `tts/` is the audio root itself.
fn resolve_declared_audio(audio_root: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() && path.exists() {
        return path.to_path_buf();
    }
    let relative = file.trim_start_matches('/');
    let relative = relative.strip_prefix("tts/").unwrap_or(relative);
    audio_root.join(relative)
}
