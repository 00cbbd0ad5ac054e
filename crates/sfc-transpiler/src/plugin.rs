//! Transpiler plugins and their resolution by language name.

use crate::{BoxError, TranspileError, TranspileOptions, TranspileResult};
use camino::Utf8PathBuf;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use source_map::SourceMap;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

/// Prefix of every conventional plugin name.
pub const PLUGIN_PREFIX: &str = "sfc-transpile-";

/// Returns the conventional plugin name for a language, e.g.
/// `sfc-transpile-coffee`.
pub fn plugin_name(lang: &str) -> String {
    format!("{PLUGIN_PREFIX}{}", lang.to_ascii_lowercase())
}

/// Transforms the text of one section.
///
/// Implemented for closures with the same signature.
pub trait Transpiler: Send + Sync {
    /// Transpiles `text`. Failures are reported to the caller unchanged.
    fn transform(&self, text: &str, options: &TranspileOptions)
        -> Result<TranspileResult, BoxError>;
}

impl<F> Transpiler for F
where
    F: Fn(&str, &TranspileOptions) -> Result<TranspileResult, BoxError> + Send + Sync,
{
    fn transform(
        &self,
        text: &str,
        options: &TranspileOptions,
    ) -> Result<TranspileResult, BoxError> {
        self(text, options)
    }
}

/// An external program used as a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCommand {
    /// Program to run.
    pub command: Utf8PathBuf,
    /// Arguments placed before the options argument.
    #[serde(default)]
    pub args: Vec<String>,
}

impl PluginCommand {
    /// Creates a command with no extra arguments.
    pub fn new(command: impl Into<Utf8PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
        }
    }
}

/// Runs a [`PluginCommand`].
///
/// The section text goes to stdin and the options are the last argument,
/// as JSON. The program prints `{"text": "...", "map": ...}` on stdout,
/// where `map` is a v3 map object, a JSON string holding one, or `null`.
#[derive(Debug, Clone)]
pub struct CommandTranspiler {
    name: String,
    command: PluginCommand,
}

#[derive(Debug, Deserialize)]
struct PluginOutput {
    text: String,
    #[serde(default)]
    map: Option<Value>,
}

impl CommandTranspiler {
    /// Creates a transpiler that reports errors under `name`.
    pub fn new(name: impl Into<String>, command: PluginCommand) -> Self {
        Self {
            name: name.into(),
            command,
        }
    }

    fn run(&self, text: &str, options: &TranspileOptions) -> Result<TranspileResult, TranspileError> {
        let request = serde_json::to_string(options).map_err(|e| self.invalid(e.to_string()))?;

        let mut child = Command::new(self.command.command.as_std_path())
            .args(&self.command.args)
            .arg(request)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TranspileError::Spawn {
                plugin: self.name.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.invalid("failed to open plugin stdin".to_string()))?;

        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || allow_broken_pipe(stdin.write_all(text.as_bytes())));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("plugin stdin writer panicked")));
            (written, output)
        });
        let spawn_error = |source| TranspileError::Spawn {
            plugin: self.name.clone(),
            source,
        };
        let output = output.map_err(spawn_error)?;
        written.map_err(spawn_error)?;

        if !output.status.success() {
            return Err(TranspileError::CommandFailed {
                plugin: self.name.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let parsed: PluginOutput =
            serde_json::from_slice(&output.stdout).map_err(|e| self.invalid(e.to_string()))?;

        let map = match parsed.map {
            None | Some(Value::Null) => None,
            Some(Value::String(json)) => Some(SourceMap::from_json(&json)),
            Some(value) => Some(SourceMap::from_json(&value.to_string())),
        }
        .transpose()
        .map_err(|e| self.invalid(format!("invalid source map: {e}")))?;

        Ok(TranspileResult {
            text: parsed.text,
            map,
        })
    }

    fn invalid(&self, message: String) -> TranspileError {
        TranspileError::InvalidPluginOutput {
            plugin: self.name.clone(),
            message,
        }
    }
}

/// A plugin that exits without reading its input closes the pipe early.
fn allow_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

impl Transpiler for CommandTranspiler {
    fn transform(
        &self,
        text: &str,
        options: &TranspileOptions,
    ) -> Result<TranspileResult, BoxError> {
        Ok(self.run(text, options)?)
    }
}

/// Where to look for installed `sfc-transpile-*` executables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PathLookup {
    /// Search `PATH`.
    #[default]
    Env,
    /// Search the given `PATH`-style directory list instead.
    Dirs(OsString),
    /// Only use registered and configured plugins.
    Disabled,
}

/// Resolves language names to transpilers.
///
/// Resolution order: transpilers registered in-process, then configured
/// commands, then a `sfc-transpile-<lang>` executable on the search path.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: FxHashMap<String, Arc<dyn Transpiler>>,
    commands: FxHashMap<String, PluginCommand>,
    lookup: PathLookup,
}

impl PluginRegistry {
    /// Creates an empty registry that searches `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets where installed plugins are searched for.
    pub fn with_path_lookup(mut self, lookup: PathLookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Registers an in-process transpiler for `lang`.
    pub fn register(&mut self, lang: &str, transpiler: impl Transpiler + 'static) {
        self.plugins
            .insert(lang.to_ascii_lowercase(), Arc::new(transpiler));
    }

    /// Configures a command plugin for `lang`.
    pub fn register_command(&mut self, lang: &str, command: PluginCommand) {
        self.commands.insert(lang.to_ascii_lowercase(), command);
    }

    /// Finds the transpiler for `lang`.
    ///
    /// # Errors
    ///
    /// Returns [`TranspileError::PluginNotFound`] when nothing handles `lang`.
    pub fn resolve(&self, lang: &str) -> Result<Arc<dyn Transpiler>, TranspileError> {
        let key = lang.to_ascii_lowercase();
        let name = plugin_name(&key);

        if let Some(plugin) = self.plugins.get(&key) {
            tracing::debug!(lang = %key, "using registered transpiler");
            return Ok(Arc::clone(plugin));
        }

        if let Some(command) = self.commands.get(&key) {
            tracing::debug!(lang = %key, command = %command.command, "using configured plugin");
            return Ok(Arc::new(CommandTranspiler::new(name, command.clone())));
        }

        if let Some(path) = self.find_executable(&name) {
            tracing::debug!(lang = %key, path = %path.display(), "using installed plugin");
            if let Ok(path) = Utf8PathBuf::try_from(path) {
                return Ok(Arc::new(CommandTranspiler::new(
                    name,
                    PluginCommand::new(path),
                )));
            }
        }

        Err(TranspileError::PluginNotFound { lang: key })
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        match &self.lookup {
            PathLookup::Env => which::which(name).ok(),
            PathLookup::Dirs(dirs) => {
                let cwd = std::env::current_dir().ok()?;
                which::which_in(name, Some(dirs), cwd).ok()
            }
            PathLookup::Disabled => None,
        }
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut plugins: Vec<_> = self.plugins.keys().collect();
        plugins.sort();
        f.debug_struct("PluginRegistry")
            .field("plugins", &plugins)
            .field("commands", &self.commands)
            .field("lookup", &self.lookup)
            .finish()
    }
}
