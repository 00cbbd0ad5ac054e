//! Options passed to transpilers and the result they return.

use serde::Serialize;
use serde_json::{Map, Value};
use source_map::SourceMap;

/// Options for transpiling one section.
///
/// Serializes to the object command plugins receive:
/// `{"file": .., "maps": .., "offset": .., "extra": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranspileOptions {
    /// Identifier of the component the section came from.
    pub file: String,
    /// Whether the caller wants a source map.
    pub maps: bool,
    /// Line shift for map correction; `0` when the section is an external file.
    pub offset: u32,
    /// User configuration for the plugin, passed through untouched.
    pub extra: Value,
}

impl TranspileOptions {
    /// Creates options for `file` with maps disabled and no offset.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    /// Sets whether maps are requested.
    pub fn with_maps(mut self, maps: bool) -> Self {
        self.maps = maps;
        self
    }

    /// Sets the line offset.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the plugin configuration.
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = extra;
        self
    }
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            file: String::new(),
            maps: false,
            offset: 0,
            extra: Value::Object(Map::new()),
        }
    }
}

/// The compiled text of a section and its map, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileResult {
    /// Final compilable code.
    pub text: String,
    /// Map from `text` back to the component.
    pub map: Option<SourceMap>,
}

impl TranspileResult {
    /// A result that returns `text` as is, without a map.
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            map: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plugin_request_shape() {
        let options = TranspileOptions::new("App.vue")
            .with_maps(true)
            .with_offset(4)
            .with_extra(json!({ "bare": true }));
        insta::assert_snapshot!(
            serde_json::to_string(&options).unwrap(),
            @r#"{"file":"App.vue","maps":true,"offset":4,"extra":{"bare":true}}"#
        );
    }

    #[test]
    fn test_default_extra_is_empty_object() {
        let options = TranspileOptions::default();
        assert_eq!(options.extra, json!({}));
        assert!(!options.maps);
    }
}
