//! Key-value configuration sources.
//!
//! [`KeyReader`] is the only way configuration enters the resolver. Readers are
//! passed by reference, never looked up globally.

use std::collections::BTreeMap;
use std::fmt;

/// Read-only view over a key-value configuration source.
pub trait KeyReader {
    /// Raw value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Value for `key` if present and non-empty.
    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|value| !value.is_empty())
    }

    /// Boolean flag. Absent, empty or unparseable values read as `false`.
    ///
    /// Accepts `true` (any case) and `1`, surrounding whitespace ignored.
    fn get_flag(&self, key: &str) -> bool {
        let Some(raw) = self.get(key) else {
            return false;
        };
        let value = raw.trim();
        if value.eq_ignore_ascii_case("true") || value == "1" {
            return true;
        }
        if !value.is_empty() && !value.eq_ignore_ascii_case("false") && value != "0" {
            tracing::warn!(key, value, "unrecognised boolean flag, treating as false");
        }
        false
    }
}

impl<R: KeyReader + ?Sized> KeyReader for &R {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Reads keys from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvKeyReader;

impl KeyReader for EnvKeyReader {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Reads keys from an explicit map.
///
/// # Example
///
/// ```rust
/// use hello_cluster::config::{KeyReader, MapKeyReader};
///
/// let reader: MapKeyReader = [("RUN_ON_AWS_ECS", "true")].into_iter().collect();
/// assert!(reader.get_flag("RUN_ON_AWS_ECS"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapKeyReader {
    values: BTreeMap<String, String>,
}

impl MapKeyReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Parse `KEY=VALUE` pairs. Entries without `=` are returned as errors.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Self, String> {
        pairs
            .into_iter()
            .map(|pair| {
                pair.split_once('=')
                    .map(|(key, value)| (key.trim().to_string(), value.to_string()))
                    .ok_or_else(|| format!("expected KEY=VALUE, got {pair:?}"))
            })
            .collect()
    }
}

impl KeyReader for MapKeyReader {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapKeyReader {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Stack of readers where later layers override earlier ones.
#[derive(Default)]
pub struct LayeredKeyReader {
    layers: Vec<Box<dyn KeyReader>>,
}

impl LayeredKeyReader {
    /// Create a reader with no layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer on top of the existing ones.
    pub fn layer(mut self, reader: impl KeyReader + 'static) -> Self {
        self.layers.push(Box::new(reader));
        self
    }
}

impl fmt::Debug for LayeredKeyReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredKeyReader")
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl KeyReader for LayeredKeyReader {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().rev().find_map(|layer| layer.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_parsing() {
        let reader: MapKeyReader = [
            ("upper", "TRUE"),
            ("padded", " true "),
            ("one", "1"),
            ("no", "false"),
            ("zero", "0"),
            ("garbage", "yes please"),
            ("empty", ""),
        ]
        .into_iter()
        .collect();

        assert!(reader.get_flag("upper"));
        assert!(reader.get_flag("padded"));
        assert!(reader.get_flag("one"));
        assert!(!reader.get_flag("no"));
        assert!(!reader.get_flag("zero"));
        assert!(!reader.get_flag("garbage"));
        assert!(!reader.get_flag("empty"));
        assert!(!reader.get_flag("missing"));
    }

    #[test]
    fn test_non_empty() {
        let reader = MapKeyReader::new().with("empty", "").with("set", "x");
        assert_eq!(reader.get_non_empty("empty"), None);
        assert_eq!(reader.get_non_empty("set").as_deref(), Some("x"));
        assert_eq!(reader.get("empty").as_deref(), Some(""));
    }

    #[test]
    fn test_from_pairs() {
        let reader = MapKeyReader::from_pairs(["A=1", "B=x=y", "C="]).expect("pairs should parse");
        assert_eq!(reader.get("A").as_deref(), Some("1"));
        assert_eq!(reader.get("B").as_deref(), Some("x=y"));
        assert_eq!(reader.get("C").as_deref(), Some(""));

        assert!(MapKeyReader::from_pairs(["novalue"]).is_err());
    }

    #[test]
    fn test_layers_override_in_order() {
        let reader = LayeredKeyReader::new()
            .layer(MapKeyReader::new().with("A", "base").with("B", "base"))
            .layer(MapKeyReader::new().with("B", "override"));

        assert_eq!(reader.get("A").as_deref(), Some("base"));
        assert_eq!(reader.get("B").as_deref(), Some("override"));
        assert_eq!(reader.get("C"), None);
    }

    #[test]
    fn test_reader_by_reference() {
        fn read(reader: impl KeyReader) -> Option<String> {
            reader.get("A")
        }
        let reader = MapKeyReader::new().with("A", "1");
        assert_eq!(read(&reader).as_deref(), Some("1"));
    }
}
