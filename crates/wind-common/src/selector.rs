//! Forecast dataset selection and the cache key derived from it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which forecast dataset to load: the latest run of a named model, or an
/// explicit file on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    Model(String),
    File(String),
}

impl Selector {
    /// The model id or file path.
    pub fn name(&self) -> &str {
        match self {
            Selector::Model(name) | Selector::File(name) => name,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Selector::Model(_) => "@model",
            Selector::File(_) => "@file",
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.suffix())
    }
}

/// Opaque cache key: only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(selector: &Selector, reduced_components: bool) -> Self {
        let flag = if reduced_components { "reduced" } else { "full" };
        Self(format!("{}{}#{}", selector.name(), selector.suffix(), flag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_equality() {
        let gfs = Selector::Model("gfs".to_string());
        assert_eq!(CacheKey::new(&gfs, true), CacheKey::new(&gfs, true));
        assert_ne!(CacheKey::new(&gfs, true), CacheKey::new(&gfs, false));
    }

    #[test]
    fn test_model_and_file_keys_differ() {
        let model = Selector::Model("gfs".to_string());
        let file = Selector::File("gfs".to_string());
        assert_ne!(CacheKey::new(&model, false), CacheKey::new(&file, false));
    }

    #[test]
    fn test_display() {
        let file = Selector::File("grib/arpege_01.grb2".to_string());
        assert_eq!(file.to_string(), "grib/arpege_01.grb2@file");
        assert_eq!(
            CacheKey::new(&file, true).as_str(),
            "grib/arpege_01.grb2@file#reduced"
        );
    }
}
