//! Language dispatch with built-in fallbacks.

use crate::map::generate_map;
use crate::plugin::plugin_name;
use crate::{PluginRegistry, TranspileError, TranspileOptions, TranspileResult};

/// Script language handled without a plugin.
pub const DEFAULT_SCRIPT_LANG: &str = "js";

/// Markup language handled without a plugin.
pub const DEFAULT_MARKUP_LANG: &str = "html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Script,
    Markup,
}

fn builtin(lang: &str) -> Option<Builtin> {
    match lang.to_ascii_lowercase().as_str() {
        "" | DEFAULT_SCRIPT_LANG | "javascript" => Some(Builtin::Script),
        DEFAULT_MARKUP_LANG => Some(Builtin::Markup),
        _ => None,
    }
}

/// Transpiles a section written in `lang`.
///
/// A plugin for `lang` always wins. Without one, default script passes
/// through with a generated map (when maps are requested and the offset is
/// positive) and default markup passes through unmapped.
///
/// # Errors
///
/// Returns [`TranspileError::MissingPlugin`] for other languages without a
/// plugin. Plugin failures are returned as the plugin reported them.
pub fn transpile(
    registry: &PluginRegistry,
    lang: &str,
    text: &str,
    options: &TranspileOptions,
) -> Result<TranspileResult, TranspileError> {
    let plugin = match registry.resolve(lang) {
        Ok(plugin) => plugin,
        Err(TranspileError::PluginNotFound { .. }) => return fallback(lang, text, options),
        Err(err) => return Err(err),
    };

    plugin
        .transform(text, options)
        .map_err(TranspileError::from_plugin)
}

fn fallback(
    lang: &str,
    text: &str,
    options: &TranspileOptions,
) -> Result<TranspileResult, TranspileError> {
    match builtin(lang) {
        Some(Builtin::Script) => {
            let map = if options.maps && options.offset > 0 {
                Some(generate_map(text, &options.file, i64::from(options.offset))?)
            } else {
                None
            };
            tracing::debug!(lang, mapped = map.is_some(), "passing script through");
            Ok(TranspileResult {
                text: text.to_string(),
                map,
            })
        }
        Some(Builtin::Markup) => {
            tracing::debug!(lang, "passing markup through");
            Ok(TranspileResult::unchanged(text))
        }
        None => Err(TranspileError::MissingPlugin {
            lang: lang.to_string(),
            plugin: plugin_name(lang),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxError, PathLookup};
    use pretty_assertions::assert_eq;

    fn registry() -> PluginRegistry {
        PluginRegistry::new().with_path_lookup(PathLookup::Disabled)
    }

    #[test]
    fn test_script_passthrough_with_map() {
        let options = TranspileOptions::new("App.vue").with_maps(true).with_offset(3);
        let result = transpile(&registry(), "js", "export default {}", &options).unwrap();
        assert_eq!(result.text, "export default {}");
        let map = result.map.unwrap();
        assert!(!map.is_empty());
        assert!(map.mappings().all(|m| m.original.line == m.generated.line + 2));
    }

    #[test]
    fn test_script_aliases() {
        let options = TranspileOptions::new("App.vue").with_maps(true).with_offset(1);
        for lang in ["JavaScript", ""] {
            let result = transpile(&registry(), lang, "x", &options).unwrap();
            assert!(result.map.is_some(), "{lang:?}");
        }
    }

    #[test]
    fn test_script_without_offset_is_unmapped() {
        let options = TranspileOptions::new("a.js").with_maps(true);
        let result = transpile(&registry(), "js", "x", &options).unwrap();
        assert_eq!(result, TranspileResult::unchanged("x"));
    }

    #[test]
    fn test_script_without_maps_is_unmapped() {
        let options = TranspileOptions::new("App.vue").with_offset(4);
        let result = transpile(&registry(), "js", "x", &options).unwrap();
        assert_eq!(result.map, None);
    }

    #[test]
    fn test_markup_passthrough() {
        let options = TranspileOptions::new("App.vue").with_maps(true).with_offset(1);
        let result = transpile(&registry(), "html", "<p>{{ x }}</p>", &options).unwrap();
        assert_eq!(result, TranspileResult::unchanged("<p>{{ x }}</p>"));
    }

    #[test]
    fn test_unknown_lang_names_plugin() {
        let err = transpile(&registry(), "coffee", "x = 1", &TranspileOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("sfc-transpile-coffee"), "{err}");
        assert!(matches!(err, TranspileError::MissingPlugin { .. }));
    }

    #[test]
    fn test_plugin_overrides_builtin() {
        let mut registry = registry();
        registry.register("js", |text: &str, _: &TranspileOptions| {
            Ok::<_, BoxError>(TranspileResult::unchanged(format!("/* wrapped */ {text}")))
        });
        let result = transpile(&registry, "js", "x", &TranspileOptions::default()).unwrap();
        assert_eq!(result.text, "/* wrapped */ x");
    }

    #[test]
    fn test_plugin_receives_options() {
        let mut registry = registry();
        registry.register("ts", |_: &str, options: &TranspileOptions| {
            Ok::<_, BoxError>(TranspileResult::unchanged(format!(
                "{}:{}:{}:{}",
                options.file, options.maps, options.offset, options.extra["strict"]
            )))
        });
        let options = TranspileOptions::new("App.vue")
            .with_maps(true)
            .with_offset(7)
            .with_extra(serde_json::json!({ "strict": true }));
        let result = transpile(&registry, "ts", "", &options).unwrap();
        assert_eq!(result.text, "App.vue:true:7:true");
    }

    #[test]
    fn test_plugin_failure_propagates() {
        let mut registry = registry();
        registry.register("ts", |_: &str, _: &TranspileOptions| {
            Err::<TranspileResult, BoxError>("type annotations are not allowed here".into())
        });
        let err = transpile(&registry, "ts", "", &TranspileOptions::default()).unwrap_err();
        assert!(matches!(err, TranspileError::Plugin(_)));
        assert_eq!(err.to_string(), "type annotations are not allowed here");
    }
}
