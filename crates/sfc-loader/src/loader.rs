//! Turning a component file into a loadable module.

use crate::{LoadError, LoaderConfig};
use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use serde::Serialize;
use sfc_parser::{extract_bytes, Section, COMPONENT_TAGS};
use sfc_transpiler::{
    transpile, PluginRegistry, TranspileOptions, DEFAULT_MARKUP_LANG, DEFAULT_SCRIPT_LANG,
};
use source_map::{LineCol, MappingEntry, SourceMap};
use std::fs;

/// A `<style>` section, untransformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleBlock {
    /// The `lang` attribute.
    pub lang: Option<String>,
    /// Whether the `scoped` attribute is present.
    pub scoped: bool,
    /// The style text, read from `src` when given.
    pub text: String,
}

/// A compiled component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    /// Canonical path of the component.
    pub path: Utf8PathBuf,
    /// Compiled script, empty for a component without one.
    pub code: String,
    /// Map from `code` back to the component.
    pub map: Option<SourceMap>,
    /// Compiled template.
    pub template: Option<String>,
    /// Style sections in document order.
    pub styles: Vec<StyleBlock>,
}

/// Loads components and remembers their script maps.
#[derive(Debug)]
pub struct Loader {
    config: LoaderConfig,
    plugins: PluginRegistry,
    maps: FxHashMap<Utf8PathBuf, SourceMap>,
}

impl Loader {
    /// Creates a loader.
    pub fn new(config: LoaderConfig, plugins: PluginRegistry) -> Self {
        Self {
            config,
            plugins,
            maps: FxHashMap::default(),
        }
    }

    /// Creates a loader whose relative plugin commands live under `base`.
    pub fn from_config(config: LoaderConfig, base: &Utf8Path) -> Self {
        let plugins = config.plugin_registry(base);
        Self::new(config, plugins)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads and compiles the component at `path`.
    ///
    /// The script map, if one is produced, replaces any cached map for the
    /// component.
    pub fn load(&mut self, path: &Utf8Path) -> Result<LoadedModule, LoadError> {
        let path = canonicalize(path)?;
        let source = fs::read(&path).map_err(|source| LoadError::Read {
            path: path.clone(),
            source,
        })?;
        let sections =
            extract_bytes(&source, &COMPONENT_TAGS).map_err(|source| LoadError::Extract {
                path: path.clone(),
                source,
            })?;

        let mut script = None;
        let mut template = None;
        let mut styles = Vec::new();
        for section in sections {
            match section.tag.as_str() {
                "script" => set_unique(&mut script, section, &path, "script")?,
                "template" => set_unique(&mut template, section, &path, "template")?,
                _ => styles.push(section),
            }
        }

        let dir = path.parent().unwrap_or(Utf8Path::new("."));

        let (code, map) = match &script {
            Some(section) => {
                let lang = section.lang().unwrap_or(DEFAULT_SCRIPT_LANG);
                let result = self.compile(&path, dir, section, lang, "script")?;
                (result.text, result.map)
            }
            None => (String::new(), None),
        };

        let template = match &template {
            Some(section) => {
                let lang = section.lang().unwrap_or(DEFAULT_MARKUP_LANG);
                Some(self.compile(&path, dir, section, lang, "template")?.text)
            }
            None => None,
        };

        let styles = styles
            .iter()
            .map(|section| {
                Ok(StyleBlock {
                    lang: section.lang().map(str::to_string),
                    scoped: section.attribute("scoped").is_some(),
                    text: read_section(dir, section)?,
                })
            })
            .collect::<Result<Vec<_>, LoadError>>()?;

        match &map {
            Some(map) => {
                tracing::debug!(%path, mappings = map.len(), "cached source map");
                self.maps.insert(path.clone(), map.clone());
            }
            None => {
                self.maps.remove(&path);
            }
        }

        Ok(LoadedModule {
            path,
            code,
            map,
            template,
            styles,
        })
    }

    fn compile(
        &self,
        path: &Utf8Path,
        dir: &Utf8Path,
        section: &Section,
        lang: &str,
        tag: &'static str,
    ) -> Result<sfc_transpiler::TranspileResult, LoadError> {
        let text = read_section(dir, section)?;
        let file = match section.src() {
            Some(src) => dir.join(src),
            None => path.to_path_buf(),
        };

        let options = TranspileOptions::new(file.as_str())
            .with_maps(self.config.maps)
            .with_offset(section.offset)
            .with_extra(self.config.extra(lang));

        transpile(&self.plugins, lang, &text, &options).map_err(|source| LoadError::Transpile {
            path: path.to_path_buf(),
            tag,
            source,
        })
    }

    /// Returns the cached script map of a loaded component.
    pub fn source_map(&self, path: &Utf8Path) -> Option<&SourceMap> {
        match canonicalize(path) {
            Ok(path) => self.maps.get(&path),
            Err(_) => self.maps.get(path),
        }
    }

    /// Resolves a 0-based position in a component's compiled script to the
    /// mapping that covers it.
    pub fn remap(&self, path: &Utf8Path, generated: LineCol) -> Option<MappingEntry<'_>> {
        let map = self.source_map(path)?;
        let mapping = map.lookup(generated)?;
        Some(MappingEntry {
            source: map.sources().get(mapping.source as usize)?,
            original: mapping.original,
            generated: mapping.generated,
            name: mapping
                .name
                .and_then(|name| map.names().get(name as usize))
                .map(String::as_str),
        })
    }

    /// Number of cached maps.
    pub fn cached_maps(&self) -> usize {
        self.maps.len()
    }

    /// Drops every cached map.
    pub fn clear_cache(&mut self) {
        tracing::debug!(count = self.maps.len(), "evicting cached source maps");
        self.maps.clear();
    }
}

fn set_unique(
    slot: &mut Option<Section>,
    section: Section,
    path: &Utf8Path,
    tag: &'static str,
) -> Result<(), LoadError> {
    if slot.is_some() {
        return Err(LoadError::DuplicateSection {
            path: path.to_path_buf(),
            tag,
        });
    }
    *slot = Some(section);
    Ok(())
}

/// Returns the section text, reading it from `src` when present.
fn read_section(dir: &Utf8Path, section: &Section) -> Result<String, LoadError> {
    let Some(src) = section.src() else {
        return Ok(section.text.clone());
    };

    let path = dir.join(src);
    fs::read_to_string(&path).map_err(|source| LoadError::Read { path, source })
}

fn canonicalize(path: &Utf8Path) -> Result<Utf8PathBuf, LoadError> {
    let canonical = path.canonicalize().map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Utf8PathBuf::try_from(canonical).map_err(|err| LoadError::NonUtf8Path(err.into_path_buf()))
}
