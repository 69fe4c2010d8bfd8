use serde::Serialize;

use crate::automation::LaunchParams;

/// Environment variable that marks a run as machine-driven.
pub const AUTOMATION_ENV: &str = "DECKCAST_AUTOMATION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PlaybackMode {
    /// Narration plays and may advance pages
    #[default]
    Interactive,
    /// Pages advance on computed durations only; nothing is spoken
    Automated,
}

/// Facts about the host that decide the playback mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessProbe {
    pub speech_available: bool,
    pub automation_flag: bool,
}

impl HeadlessProbe {
    pub fn from_env(speech_available: bool) -> Self {
        let automation_flag = std::env::var(AUTOMATION_ENV)
            .map(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(false);
        Self {
            speech_available,
            automation_flag,
        }
    }
}

impl PlaybackMode {
    pub fn detect(probe: &HeadlessProbe, params: &LaunchParams) -> Self {
        let headless = !probe.speech_available
            || probe.automation_flag
            || params.recording
            || params.autoplay;
        if headless {
            PlaybackMode::Automated
        } else {
            PlaybackMode::Interactive
        }
    }

    pub fn narrates(&self) -> bool {
        matches!(self, PlaybackMode::Interactive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP: HeadlessProbe = HeadlessProbe {
        speech_available: true,
        automation_flag: false,
    };

    #[test]
    fn plain_desktop_launch_is_interactive() {
        assert_eq!(
            PlaybackMode::detect(&DESKTOP, &LaunchParams::default()),
            PlaybackMode::Interactive
        );
    }

    #[test]
    fn any_headless_signal_selects_automated() {
        let no_speech = HeadlessProbe {
            speech_available: false,
            ..DESKTOP
        };
        let automation = HeadlessProbe {
            automation_flag: true,
            ..DESKTOP
        };
        let autoplay = LaunchParams {
            autoplay: true,
            ..Default::default()
        };
        let recording = LaunchParams {
            recording: true,
            ..Default::default()
        };

        let plain = LaunchParams::default();
        assert_eq!(PlaybackMode::detect(&no_speech, &plain), PlaybackMode::Automated);
        assert_eq!(PlaybackMode::detect(&automation, &plain), PlaybackMode::Automated);
        assert_eq!(PlaybackMode::detect(&DESKTOP, &autoplay), PlaybackMode::Automated);
        assert_eq!(PlaybackMode::detect(&DESKTOP, &recording), PlaybackMode::Automated);
    }
}
