use crate::domain::ports::FeatureFlags;
use std::collections::HashMap;

/// `[features]` 區段；未列出的功能視為關閉
#[derive(Debug, Clone, Default)]
pub struct ConfigFeatureFlags {
    flags: HashMap<String, bool>,
}

impl ConfigFeatureFlags {
    pub fn new(flags: HashMap<String, bool>) -> Self {
        Self { flags }
    }
}

impl FeatureFlags for ConfigFeatureFlags {
    fn enabled(&self, flag: &str) -> bool {
        self.flags.get(flag).copied().unwrap_or(false)
    }
}
