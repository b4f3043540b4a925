use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Text in several languages, keyed by two-letter language code
///
/// Keys are normalized when loaded: `"de-AT"` is stored under `"de"` and `null` entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LocalizedText {
    values: BTreeMap<String, String>,
}

impl LocalizedText {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a translation, normalizing the language key.
    #[must_use]
    pub fn with(mut self, language: &str, text: impl Into<String>) -> Self {
        let _ = self.values.insert(language_key(language), text.into());
        self
    }

    /// Looks up the text for `language` (full locale identifiers such as `"en-US"` are accepted).
    #[must_use]
    pub fn get(&self, language: &str) -> Option<&str> {
        self.values.get(&language_key(language)).map(String::as_str)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'de> Deserialize<'de> for LocalizedText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Option<String>>::deserialize(deserializer)?;
        let mut text = Self::new();
        for (language, value) in raw {
            if let Some(value) = value {
                text = text.with(&language, value);
            }
        }
        Ok(text)
    }
}

fn language_key(language: &str) -> String {
    language.chars().take(2).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_truncated_and_nulls_dropped() {
        let text: LocalizedText = serde_json::from_str(r#"{"de-AT": "Ungültig", "en": "Invalid", "fr": null}"#).unwrap();
        assert_eq!(text.languages().collect::<Vec<_>>(), vec!["de", "en"]);
        assert_eq!(text.get("de"), Some("Ungültig"));
        assert_eq!(text.get("en-GB"), Some("Invalid"));
        assert!(text.get("fr").is_none());
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let text = LocalizedText::new().with("en", "Entry");
        assert_eq!(serde_json::to_string(&text).unwrap(), r#"{"en":"Entry"}"#);
    }
}
