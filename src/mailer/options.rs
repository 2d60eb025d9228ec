//! Process-wide mailer options

use serde::Serialize;
use serde_json::{Map, Value};

/// Options merged by [`Mailer::set_options`](super::Mailer::set_options).
///
/// Only `cache` is interpreted. Other keys are kept and returned by
/// [`MailerOptions::get`] but change nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MailerOptions {
    values: Map<String, Value>,
}

impl MailerOptions {
    pub const CACHE: &'static str = "cache";

    pub fn with_cache(cache: bool) -> Self {
        let mut values = Map::new();
        values.insert(Self::CACHE.to_string(), Value::Bool(cache));
        Self { values }
    }

    /// Merge keys into the current options, replacing same-named keys
    pub fn merge(&mut self, options: Map<String, Value>) {
        for (key, value) in options {
            if key == Self::CACHE && !value.is_boolean() {
                tracing::warn!(value = %value, "Ignoring non-boolean cache option");
                continue;
            }
            self.values.insert(key, value);
        }
    }

    /// Whether templates are compiled at registration
    pub fn cache(&self) -> bool {
        self.values
            .get(Self::CACHE)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_cache_defaults_off() {
        assert!(!MailerOptions::default().cache());
        assert!(MailerOptions::with_cache(true).cache());
    }

    #[test]
    fn test_merge_keeps_unknown_keys() {
        let mut options = MailerOptions::with_cache(true);
        options.merge(map(json!({"future_flag": 3})));

        assert!(options.cache());
        assert_eq!(options.get("future_flag"), Some(&json!(3)));
    }

    #[test]
    fn test_merge_overrides_cache() {
        let mut options = MailerOptions::with_cache(true);
        options.merge(map(json!({"cache": false})));
        assert!(!options.cache());
    }

    #[test]
    fn test_non_boolean_cache_is_ignored() {
        let mut options = MailerOptions::with_cache(true);
        options.merge(map(json!({"cache": "no"})));
        assert!(options.cache());
    }
}
