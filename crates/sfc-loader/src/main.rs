//! sfc-loader: load single-file components as plain script modules.

mod cli;
mod output;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use cli::{Args, Command};
use miette::{IntoDiagnostic, Result, WrapErr};
use output::{error_chain, Formatter};
use sfc_loader::{Loader, LoaderConfig, LoaderRegistry, ModuleTable};
use sfc_parser::{extract_bytes, COMPONENT_TAGS};
use std::fs;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::{DirEntry, WalkDir};

/// Directories never searched for components.
const SKIPPED_DIRS: [&str; 2] = ["node_modules", "target"];

/// Sets up logging to stderr.
///
/// `RUST_LOG` wins over the verbosity flags:
/// - 0: warnings only
/// - 1 (-v): INFO
/// - 2 (-vv): DEBUG for the loader crates
/// - 3+ (-vvv): TRACE with file/line numbers
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "info".to_string(),
            2 => "info,sfc_loader=debug,sfc_parser=debug,sfc_transpiler=debug".to_string(),
            _ => "debug,sfc_loader=trace,sfc_parser=trace,sfc_transpiler=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_file(verbose >= 3)
                .with_line_number(verbose >= 3)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => LoaderConfig::from_file(path).into_diagnostic()?,
        None => LoaderConfig::load(&args.workspace),
    };

    match args.command {
        Command::Extract { file, tags, output } => {
            let source = fs::read(&file)
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to read {file}"))?;
            let tags = if tags.is_empty() {
                COMPONENT_TAGS.iter().map(|tag| tag.to_string()).collect()
            } else {
                tags
            };
            let sections = extract_bytes(&source, &tags)
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to extract sections from {file}"))?;
            print!("{}", Formatter::new(output).sections(&file, &sections));
        }
        Command::Compile {
            file,
            no_maps,
            output,
        } => {
            let mut config = config;
            if no_maps {
                config.maps = false;
            }
            let mut loader = Loader::from_config(config, &args.workspace);
            let module = loader.load(&file)?;
            print!("{}", Formatter::new(output).module(&module));
        }
        Command::Check { paths } => {
            let failed = check(config, &args.workspace, paths);
            if failed > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Loads every component under `paths` and returns how many failed.
fn check(config: LoaderConfig, workspace: &Utf8Path, paths: Vec<Utf8PathBuf>) -> usize {
    let roots = if paths.is_empty() {
        vec![workspace.to_path_buf()]
    } else {
        paths
    };

    let extension = config.extension.clone();
    let files: Vec<Utf8PathBuf> = roots
        .iter()
        .flat_map(|root| {
            WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !is_skipped(e))
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
        })
        .filter(|p| p.extension() == Some(extension.as_str()))
        .collect();
    tracing::info!(count = files.len(), "found components");

    let mut registry = LoaderRegistry::new(Loader::from_config(config, workspace));
    let mut modules = ModuleTable::new();
    registry.install(&mut modules);

    let mut failed = 0;
    for file in &files {
        match registry.require(&mut modules, file) {
            Ok(()) => tracing::info!(%file, "loaded component"),
            Err(err) => {
                failed += 1;
                eprintln!("{file}\nError: {}\n", error_chain(&err));
            }
        }
    }

    println!(
        "Checked {} components: {} loaded, {} failed",
        files.len(),
        modules.len(),
        failed
    );
    registry.uninstall(&mut modules);
    failed
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || SKIPPED_DIRS.contains(&name))
}
