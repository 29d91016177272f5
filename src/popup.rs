use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

/// Text set shipped with the binary.
pub const DEFAULT_TEXTS: &str = include_str!("../assets/popup_texts.json");

/// Which popup is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopupKind {
    Intro,
    Done,
}

/// Popup currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupState {
    #[default]
    None,
    Intro,
    Done,
}

impl PopupState {
    pub fn is_shown(self) -> bool {
        self != PopupState::None
    }
}

impl From<PopupKind> for PopupState {
    fn from(kind: PopupKind) -> Self {
        match kind {
            PopupKind::Intro => PopupState::Intro,
            PopupKind::Done => PopupState::Done,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextPair {
    pub title: String,
    pub body: String,
}

/// Popup texts keyed by kind.
///
/// The on-disk format is a flat JSON object with `introTitle`, `introText`,
/// `correctTitle` and `correctText` keys. Any of them may be missing; a
/// missing entry renders as an empty field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupTexts {
    #[serde(default)]
    intro_title: Option<String>,
    #[serde(default)]
    intro_text: Option<String>,
    #[serde(default)]
    correct_title: Option<String>,
    #[serde(default)]
    correct_text: Option<String>,
}

impl PopupTexts {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// The embedded text set.
    pub fn builtin() -> Self {
        // The embedded file is covered by `builtin_texts_are_complete`.
        Self::from_json(DEFAULT_TEXTS).unwrap_or_default()
    }

    /// Resolves the title and body for `kind`, leaving absent entries empty.
    pub fn pair(&self, kind: PopupKind) -> TextPair {
        let (title, body) = match kind {
            PopupKind::Intro => (&self.intro_title, &self.intro_text),
            PopupKind::Done => (&self.correct_title, &self.correct_text),
        };
        if title.is_none() || body.is_none() {
            warn!(?kind, "popup text missing, leaving field empty");
        }
        TextPair {
            title: title.clone().unwrap_or_default(),
            body: body.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_texts_are_complete() {
        let texts = PopupTexts::from_json(DEFAULT_TEXTS).unwrap();
        for kind in [PopupKind::Intro, PopupKind::Done] {
            let pair = texts.pair(kind);
            assert!(!pair.title.is_empty());
            assert!(!pair.body.is_empty());
        }
    }

    #[test]
    fn pairs_follow_kind() {
        let texts = PopupTexts::from_json(
            r#"{"introTitle":"A","introText":"B","correctTitle":"C","correctText":"D"}"#,
        )
        .unwrap();
        assert_eq!(
            texts.pair(PopupKind::Intro),
            TextPair {
                title: "A".into(),
                body: "B".into()
            }
        );
        assert_eq!(
            texts.pair(PopupKind::Done),
            TextPair {
                title: "C".into(),
                body: "D".into()
            }
        );
    }

    #[test]
    fn missing_entries_degrade_to_empty() {
        let texts = PopupTexts::from_json(r#"{"introTitle":"Only a title"}"#).unwrap();
        let intro = texts.pair(PopupKind::Intro);
        assert_eq!(intro.title, "Only a title");
        assert_eq!(intro.body, "");
        assert_eq!(texts.pair(PopupKind::Done), TextPair::default());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            PopupTexts::from_json("{not json"),
            Err(ConfigError::Texts(_))
        ));
    }

    #[test]
    fn popup_state_from_kind() {
        assert_eq!(PopupState::from(PopupKind::Intro), PopupState::Intro);
        assert!(PopupState::from(PopupKind::Done).is_shown());
        assert!(!PopupState::None.is_shown());
    }
}
