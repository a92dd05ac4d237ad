use std::collections::BTreeMap;

use super::model::KEYS;
use super::{Config, ConfigSource};

impl Config {
    /// Effective configuration as `key -> (value, source)`, sorted by key.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        KEYS.iter()
            .map(|key| {
                let source = self
                    .source_attribution
                    .get(*key)
                    .unwrap_or(&ConfigSource::Default);
                (
                    (*key).to_string(),
                    (self.value_of(key), source.as_str().to_string()),
                )
            })
            .collect()
    }

    fn value_of(&self, key: &str) -> String {
        match key {
            "shell.path" => self.shell.path.display().to_string(),
            "shell.flags" => self.shell.flags.clone(),
            "elevation.tool" => self.elevation.tool.clone(),
            "elevation.flags" => self.elevation.flags.clone(),
            "elevation.group" => self.elevation.group.clone(),
            "elevation.service_account" => self.elevation.service_account.clone(),
            _ => String::new(),
        }
    }
}
