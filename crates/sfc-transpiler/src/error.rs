//! Transpile error types.

use miette::Diagnostic;
use thiserror::Error;

/// The error type plugins report failures with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error from transpiling a section.
#[derive(Debug, Error, Diagnostic)]
pub enum TranspileError {
    /// No plugin is registered, configured or installed for the language.
    ///
    /// [`transpile`](crate::transpile) handles this by falling back to the
    /// built-in languages, so callers only see it from
    /// [`PluginRegistry::resolve`](crate::PluginRegistry::resolve).
    #[error("no transpiler plugin found for lang `{lang}`")]
    PluginNotFound {
        /// The requested language.
        lang: String,
    },

    /// A language with no built-in handling needs a plugin that is missing.
    #[error("lang `{lang}` requires the `{plugin}` plugin, which is not installed")]
    #[diagnostic(
        code(sfc::missing_plugin),
        help("install it with `cargo install {plugin}`, or configure a command for `{lang}` under `plugins`")
    )]
    MissingPlugin {
        /// The requested language.
        lang: String,
        /// The conventional plugin name.
        plugin: String,
    },

    /// A map was requested with a line offset below 1.
    #[error("source map offset must be a positive line number, got {offset}")]
    #[diagnostic(code(sfc::invalid_offset))]
    InvalidOffset {
        /// The rejected offset.
        offset: i64,
    },

    /// A plugin process could not be started.
    #[error("failed to run plugin `{plugin}`: {source}")]
    Spawn {
        /// The plugin name.
        plugin: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A plugin process exited unsuccessfully.
    #[error("plugin `{plugin}` exited with {status}: {stderr}")]
    CommandFailed {
        /// The plugin name.
        plugin: String,
        /// The exit status.
        status: String,
        /// Whatever the plugin wrote to stderr.
        stderr: String,
    },

    /// A plugin process printed something other than a result object.
    #[error("plugin `{plugin}` produced invalid output: {message}")]
    InvalidPluginOutput {
        /// The plugin name.
        plugin: String,
        /// What was wrong.
        message: String,
    },

    /// A plugin failed; its error is passed through unchanged.
    #[error(transparent)]
    Plugin(BoxError),
}

impl TranspileError {
    /// Wraps an error returned by a plugin, unwrapping errors that are
    /// already a `TranspileError`.
    pub(crate) fn from_plugin(err: BoxError) -> Self {
        match err.downcast::<TranspileError>() {
            Ok(err) => *err,
            Err(err) => TranspileError::Plugin(err),
        }
    }
}
