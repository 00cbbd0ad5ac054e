//! Section transpilation for single-file components.
//!
//! This crate turns the text of an extracted section into compilable code.
//! It handles:
//! - Resolving a transpiler plugin from the section's language
//! - Passing default script and markup through when no plugin exists
//! - Generating token-level source maps for script that is passed through
//!
//! # Example
//!
//! ```
//! use sfc_transpiler::{transpile, PathLookup, PluginRegistry, TranspileOptions};
//!
//! let registry = PluginRegistry::new().with_path_lookup(PathLookup::Disabled);
//! let options = TranspileOptions::new("App.vue").with_maps(true).with_offset(4);
//!
//! let result = transpile(&registry, "js", "\nexport default {}\n", &options).unwrap();
//! assert_eq!(result.text, "\nexport default {}\n");
//! assert!(result.map.is_some());
//! ```

mod dispatch;
mod error;
mod map;
mod options;
mod plugin;

pub use dispatch::{transpile, DEFAULT_MARKUP_LANG, DEFAULT_SCRIPT_LANG};
pub use error::{BoxError, TranspileError};
pub use map::generate_map;
pub use options::{TranspileOptions, TranspileResult};
pub use plugin::{
    plugin_name, CommandTranspiler, PathLookup, PluginCommand, PluginRegistry, Transpiler,
    PLUGIN_PREFIX,
};
