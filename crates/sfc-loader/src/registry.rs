//! Installing the loader into a module host.

use crate::{LoadError, LoadedModule, Loader, ModuleHost};
use camino::Utf8Path;

/// Owns a [`Loader`] and its registration with a [`ModuleHost`].
///
/// Only one registry can be installed per extension at a time.
#[derive(Debug)]
pub struct LoaderRegistry {
    loader: Loader,
    installed: bool,
}

impl LoaderRegistry {
    /// Creates an uninstalled registry.
    pub fn new(loader: Loader) -> Self {
        Self {
            loader,
            installed: false,
        }
    }

    /// The extension this registry handles.
    pub fn extension(&self) -> &str {
        &self.loader.config().extension
    }

    /// Returns true while installed.
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Returns the loader.
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Registers the extension with `host`.
    ///
    /// Returns false, changing nothing, if this registry is already
    /// installed or the extension already has a handler.
    pub fn install(&mut self, host: &mut impl ModuleHost) -> bool {
        if self.installed {
            tracing::debug!(extension = self.extension(), "loader already installed");
            return false;
        }
        if !host.register_extension(self.extension()) {
            tracing::debug!(extension = self.extension(), "extension already has a handler");
            return false;
        }

        tracing::debug!(extension = self.extension(), "installed component loader");
        self.installed = true;
        true
    }

    /// Unregisters the extension, evicts every loaded component from `host`
    /// and drops all cached maps.
    ///
    /// Returns false if the registry was not installed.
    pub fn uninstall(&mut self, host: &mut impl ModuleHost) -> bool {
        if !self.installed {
            return false;
        }

        host.unregister_extension(self.extension());
        for path in host.loaded_modules() {
            if path.extension() == Some(self.extension()) {
                tracing::debug!(%path, "evicting component");
                host.evict(&path);
            }
        }
        self.loader.clear_cache();
        self.installed = false;

        tracing::debug!(extension = self.extension(), "uninstalled component loader");
        true
    }

    /// Loads a component without handing it to a host.
    pub fn load(&mut self, path: &Utf8Path) -> Result<LoadedModule, LoadError> {
        if !self.installed {
            return Err(LoadError::NotInstalled);
        }
        if path.extension() != Some(self.extension()) {
            return Err(LoadError::UnsupportedExtension {
                path: path.to_path_buf(),
                extension: self.extension().to_string(),
            });
        }
        self.loader.load(path)
    }

    /// Loads a component and defines it in `host`.
    pub fn require(&mut self, host: &mut impl ModuleHost, path: &Utf8Path) -> Result<(), LoadError> {
        let module = self.load(path)?;
        host.define(module);
        Ok(())
    }
}
