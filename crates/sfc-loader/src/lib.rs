//! Loads single-file components as plain script modules.
//!
//! A component's `<script>` is compiled (through a plugin when it has a
//! `lang`), its `<template>` is compiled the same way, and the script map is
//! cached so stack traces against the compiled code can be resolved back to
//! component lines.
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use sfc_loader::{Loader, LoaderConfig, LoaderRegistry, ModuleTable};
//! use source_map::LineCol;
//!
//! let root = Utf8Path::new(".");
//! let loader = Loader::from_config(LoaderConfig::load(root), root);
//! let mut registry = LoaderRegistry::new(loader);
//! let mut modules = ModuleTable::new();
//!
//! registry.install(&mut modules);
//! registry.require(&mut modules, Utf8Path::new("src/App.vue"))?;
//! if let Some(entry) = registry.loader().remap(Utf8Path::new("src/App.vue"), LineCol::new(1, 0)) {
//!     println!("{}:{}", entry.source, entry.original.line + 1);
//! }
//! registry.uninstall(&mut modules);
//! # Ok::<(), sfc_loader::LoadError>(())
//! ```

pub mod config;
mod error;
mod host;
mod loader;
mod registry;

pub use config::{ConfigError, LoaderConfig};
pub use error::LoadError;
pub use host::{ModuleHost, ModuleTable};
pub use loader::{LoadedModule, Loader, StyleBlock};
pub use registry::LoaderRegistry;
