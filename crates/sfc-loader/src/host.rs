//! The module system components are loaded into.

use crate::LoadedModule;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, IndexSet};

/// A shared module-loading subsystem that file-type handlers plug into.
pub trait ModuleHost {
    /// Routes files with `extension` to the component loader.
    ///
    /// Returns false if the extension already has a handler.
    fn register_extension(&mut self, extension: &str) -> bool;

    /// Removes the handler for `extension`.
    fn unregister_extension(&mut self, extension: &str);

    /// Takes a compiled component.
    fn define(&mut self, module: LoadedModule);

    /// Paths of every module currently loaded.
    fn loaded_modules(&self) -> Vec<Utf8PathBuf>;

    /// Drops a loaded module so that it is loaded again on next use.
    fn evict(&mut self, path: &Utf8Path);
}

/// An in-memory [`ModuleHost`].
#[derive(Debug, Default)]
pub struct ModuleTable {
    extensions: IndexSet<String>,
    modules: IndexMap<Utf8PathBuf, LoadedModule>,
}

impl ModuleTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `extension` has a handler.
    pub fn is_registered(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    /// Returns a loaded module.
    pub fn get(&self, path: &Utf8Path) -> Option<&LoadedModule> {
        self.modules.get(path)
    }

    /// Number of loaded modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleHost for ModuleTable {
    fn register_extension(&mut self, extension: &str) -> bool {
        self.extensions.insert(extension.to_string())
    }

    fn unregister_extension(&mut self, extension: &str) {
        self.extensions.shift_remove(extension);
    }

    fn define(&mut self, module: LoadedModule) {
        self.modules.insert(module.path.clone(), module);
    }

    fn loaded_modules(&self) -> Vec<Utf8PathBuf> {
        self.modules.keys().cloned().collect()
    }

    fn evict(&mut self, path: &Utf8Path) {
        self.modules.shift_remove(path);
    }
}
