//! Load errors.

use camino::Utf8PathBuf;
use miette::Diagnostic;
use sfc_parser::ExtractError;
use sfc_transpiler::TranspileError;
use std::path::PathBuf;
use thiserror::Error;

/// An error loading a component.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    /// A component or referenced file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// The file that failed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// The component could not be split into sections.
    #[error("failed to extract sections from {path}")]
    #[diagnostic(code(sfc::extract))]
    Extract {
        /// The component.
        path: Utf8PathBuf,
        /// The extraction error.
        source: ExtractError,
    },

    /// A component has more than one section that must be unique.
    #[error("{path} has more than one <{tag}> section")]
    #[diagnostic(
        code(sfc::duplicate_section),
        help("a component may only have one <{tag}>; merge them")
    )]
    DuplicateSection {
        /// The component.
        path: Utf8PathBuf,
        /// The repeated tag.
        tag: &'static str,
    },

    /// A section could not be transpiled.
    #[error("failed to transpile <{tag}> in {path}")]
    Transpile {
        /// The component.
        path: Utf8PathBuf,
        /// The section tag.
        tag: &'static str,
        /// The transpile error.
        #[diagnostic_source]
        source: TranspileError,
    },

    /// A file was loaded through a registry whose extension it does not have.
    #[error("{path} is not a `.{extension}` component")]
    UnsupportedExtension {
        /// The file.
        path: Utf8PathBuf,
        /// The registered extension.
        extension: String,
    },

    /// The registry is not installed.
    #[error("the component loader is not installed")]
    NotInstalled,
}
