//! Shared, content-addressed cell format definitions (`formats.json`)

use std::collections::{BTreeMap, HashMap};

use serde_json::{Value, json};
use sheetsync_fs::{NormalizedPath, io};

use crate::Result;

/// Format id applied to cells carrying an error message
pub const ERROR_FORMAT: u32 = 0;
/// Format id applied to cells carrying a warning message
pub const WARN_FORMAT: u32 = 1;
/// Format id applied to cells carrying an info message
pub const INFO_FORMAT: u32 = 2;

/// Ids at or below this are reserved for applied message formats.
pub const LAST_APPLIED_FORMAT: u32 = INFO_FORMAT;

/// Bidirectional map between format ids and format definitions.
///
/// Structurally identical formats share one id: the key of a format is its
/// canonical JSON text (object keys sorted), assigned an id on first sight
/// and reused thereafter.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    by_id: BTreeMap<u32, Value>,
    by_key: HashMap<String, u32>,
}

impl FormatRegistry {
    /// Registry holding only the three applied message formats.
    pub fn with_applied_formats() -> Self {
        let mut registry = Self::default();
        registry.insert(ERROR_FORMAT, applied_format(1.0, 0.7019608, 0.7019608));
        registry.insert(WARN_FORMAT, applied_format(1.0, 1.0, 0.5921569));
        registry.insert(INFO_FORMAT, applied_format(0.7254902, 0.87058824, 1.0));
        registry
    }

    /// Load from `formats.json`; a missing or empty file yields an empty registry.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = io::read_text(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let by_id: BTreeMap<u32, Value> = serde_json::from_str(&content)?;
        let mut registry = Self::default();
        for (id, format) in by_id {
            registry.insert(id, format);
        }
        Ok(registry)
    }

    /// Write to `formats.json` with sorted keys.
    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.by_id)?;
        io::write_text(path, &content)?;
        Ok(())
    }

    /// Canonical text used to compare formats.
    pub fn canonical_key(format: &Value) -> String {
        // serde_json maps are ordered by key, so plain serialization is canonical
        format.to_string()
    }

    /// Id for `format`, registering it under the next free id if unseen.
    pub fn id_for(&mut self, format: &Value) -> u32 {
        let key = Self::canonical_key(format);
        if let Some(id) = self.by_key.get(&key) {
            return *id;
        }
        let id = self
            .by_id
            .keys()
            .next_back()
            .map_or(LAST_APPLIED_FORMAT + 1, |last| (last + 1).max(LAST_APPLIED_FORMAT + 1));
        self.insert(id, format.clone());
        tracing::debug!(id, "Registered new cell format");
        id
    }

    pub fn get(&self, id: u32) -> Option<&Value> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn insert(&mut self, id: u32, format: Value) {
        self.by_key.entry(Self::canonical_key(&format)).or_insert(id);
        self.by_id.insert(id, format);
    }
}

fn applied_format(red: f64, green: f64, blue: f64) -> Value {
    let color = json!({"red": red, "green": green, "blue": blue});
    let border = json!({"style": "SOLID", "width": 1, "color": {}, "colorStyle": {"rgbColor": {}}});
    json!({
        "backgroundColor": color,
        "backgroundColorStyle": {"rgbColor": color},
        "borders": {"top": border, "bottom": border, "left": border, "right": border},
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_formats_share_an_id() {
        let mut registry = FormatRegistry::with_applied_formats();
        let a = json!({"textFormat": {"bold": true, "italic": false}});
        let b = json!({"textFormat": {"italic": false, "bold": true}});

        let id_a = registry.id_for(&a);
        assert_eq!(id_a, 3);
        assert_eq!(registry.id_for(&b), id_a);
        assert_eq!(registry.id_for(&json!({"wrapStrategy": "WRAP"})), 4);
    }

    #[test]
    fn new_ids_skip_reserved_range_in_empty_registry() {
        let mut registry = FormatRegistry::default();
        assert_eq!(registry.id_for(&json!({"x": 1})), LAST_APPLIED_FORMAT + 1);
    }

    #[test]
    fn save_and_load_preserve_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join("formats.json"));

        let mut registry = FormatRegistry::with_applied_formats();
        let custom = json!({"numberFormat": {"type": "PERCENT"}});
        let id = registry.id_for(&custom);
        registry.save(&path).unwrap();

        let mut loaded = FormatRegistry::load(&path).unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.get(id), Some(&custom));
        assert_eq!(loaded.id_for(&custom), id);
        assert!(loaded.get(ERROR_FORMAT).is_some());
    }
}
