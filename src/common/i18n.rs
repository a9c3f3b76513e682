// src/common/i18n.rs

use std::{collections::HashMap, sync::OnceLock};

use anyhow::Context;

const FALLBACK_LANG: &str = "en";

// Dictionaries ship inside the binary.
const DICTIONARIES: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pl", include_str!("../../locales/pl.json")),
    ("de", include_str!("../../locales/de.json")),
];

/// Flat key -> message dictionaries, one per language.
#[derive(Debug, Default)]
pub struct I18nStore {
    dictionaries: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut dictionaries = HashMap::new();
        for (lang, raw) in DICTIONARIES {
            let dictionary: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("invalid dictionary for '{}'", lang))?;
            dictionaries.insert(lang.to_string(), dictionary);
        }
        Ok(Self { dictionaries })
    }

    /// Process-wide store, used where no `AppState` is at hand.
    pub fn shared() -> &'static I18nStore {
        static STORE: OnceLock<I18nStore> = OnceLock::new();
        STORE.get_or_init(|| {
            I18nStore::load().unwrap_or_else(|e| {
                tracing::error!("failed to load dictionaries: {:?}", e);
                I18nStore::default()
            })
        })
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.dictionaries.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }

    /// Looks the key up in `lang`, then in English, then returns the key itself.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(FALLBACK_LANG, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Same as `translate`, replacing `{name}` placeholders.
    pub fn translate_with(&self, lang: &str, key: &str, args: &[(&str, &str)]) -> String {
        let mut message = self.translate(lang, key);
        for (name, value) in args {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.dictionaries
            .get(lang)
            .and_then(|d| d.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_dictionaries_parse() {
        let store = I18nStore::load().expect("dictionaries");
        assert_eq!(store.languages(), vec!["de", "en", "pl"]);
    }

    #[test]
    fn every_english_key_exists_in_other_languages() {
        let store = I18nStore::load().unwrap();
        let en = &store.dictionaries["en"];
        for lang in ["pl", "de"] {
            let other = &store.dictionaries[lang];
            for key in en.keys() {
                assert!(other.contains_key(key), "{} missing in {}", key, lang);
            }
        }
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::load().unwrap();
        assert_eq!(
            store.translate("fr", "scan.exists"),
            store.translate("en", "scan.exists")
        );
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("pl", "no.such.key"), "no.such.key");
    }

    #[test]
    fn placeholders_are_substituted() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate_with("en", "resource.not_found", &[("resource", "news")]);
        assert!(msg.contains("news"));
        assert!(!msg.contains("{resource}"));
    }
}
