use std::borrow::Cow;

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Launch options a player URL carries, e.g. `?script=q3&autoplay=true&recording=true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchParams {
    pub script: Option<String>,
    pub autoplay: bool,
    pub recording: bool,
}

impl LaunchParams {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (Cow<'a, str>, Cow<'a, str>)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                "script" if !value.is_empty() => params.script = Some(value.into_owned()),
                "autoplay" => params.autoplay = value == "true",
                "recording" => params.recording = value == "true",
                _ => {}
            }
        }
        params
    }

    pub fn from_url(url: &Url) -> Self {
        Self::from_pairs(url.query_pairs())
    }

    /// Parse a bare query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        Url::parse(&format!("player://launch/?{query}"))
            .map(|url| Self::from_url(&url))
            .unwrap_or_default()
    }

    /// Query string without the leading `?`, empty when nothing is set.
    pub fn to_query(&self) -> String {
        let base = Url::parse("player://launch/").expect("static launch url is valid");
        self.to_url(&base).query().unwrap_or_default().to_string()
    }

    /// `base` with its query replaced by these parameters.
    pub fn to_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_query(None);
        {
            let mut query = url.query_pairs_mut();
            if let Some(script) = &self.script {
                query.append_pair("script", script);
            }
            if self.autoplay {
                query.append_pair("autoplay", "true");
            }
            if self.recording {
                query.append_pair("recording", "true");
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        url
    }

    /// Parameters the automation driver launches a recording run with.
    pub fn for_recording(script: impl Into<String>) -> Self {
        Self {
            script: Some(script.into()),
            autoplay: true,
            recording: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_driver_query() {
        let params = LaunchParams::from_query("?script=q3-insights&autoplay=true&recording=true");
        assert_eq!(params, LaunchParams::for_recording("q3-insights"));
    }

    #[test]
    fn flags_must_be_literally_true() {
        let params = LaunchParams::from_query("autoplay=1&recording=yes&script=");
        assert_eq!(params, LaunchParams::default());
    }

    #[test]
    fn decodes_percent_escapes() {
        let params = LaunchParams::from_query("script=market%20review");
        assert_eq!(params.script.as_deref(), Some("market review"));
    }

    #[test]
    fn builds_player_url() {
        let base = Url::parse("http://localhost:5173/?stale=1").unwrap();
        let url = LaunchParams::for_recording("q3").to_url(&base);
        assert_eq!(
            url.as_str(),
            "http://localhost:5173/?script=q3&autoplay=true&recording=true"
        );
        assert_eq!(LaunchParams::from_url(&url), LaunchParams::for_recording("q3"));

        let bare = LaunchParams::default().to_url(&base);
        assert_eq!(bare.as_str(), "http://localhost:5173/");
    }

    #[test]
    fn query_round_trips_through_the_parser() {
        let params = LaunchParams {
            script: Some("market review".to_string()),
            autoplay: true,
            recording: false,
        };
        let query = params.to_query();
        assert_eq!(query, "script=market+review&autoplay=true");
        assert_eq!(LaunchParams::from_query(&query), params);
        assert_eq!(LaunchParams::default().to_query(), "");
    }
}
