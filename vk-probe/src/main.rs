//! Vulkan loader probe
//!
//! Loads the Vulkan loader through `vkbind-rs`, builds its entry table and
//! prints what the installation offers: instance version, layers and
//! extensions. Extra exports can be checked with `--symbol`.

mod report;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use vkbind_rs::{Binding, BindingConfig, FallbackPolicy, SymbolTable};

#[derive(Debug, Parser)]
#[command(name = "vk-probe", version, about = "Inspect the installed Vulkan loader")]
struct Args {
    /// Library to load instead of the platform's Vulkan loader
    #[arg(long)]
    library: Option<String>,

    /// Directory to retry in when the library is not on the system search path
    #[arg(long)]
    search_dir: Option<PathBuf>,

    /// Never retry in the search directory
    #[arg(long, conflicts_with = "search_dir")]
    no_fallback: bool,

    /// Additional exports that must resolve
    #[arg(long = "symbol", value_name = "NAME")]
    symbols: Vec<String>,

    /// List the extensions provided by each layer too
    #[arg(long)]
    layer_extensions: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> BindingConfig {
        let mut config = BindingConfig::default();
        if let Some(name) = &self.library {
            config = config.with_library_name(name.clone());
        }
        if let Some(dir) = &self.search_dir {
            config = config.with_search_directory(dir.clone());
        }
        if self.no_fallback {
            config = config.with_fallback(FallbackPolicy::Never);
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let binding = Binding::new(args.config());
    binding
        .initialize()
        .context("Failed to load the Vulkan loader library")?;
    if let Some(path) = binding.library_path() {
        println!("Loaded {}", path.display());
    }

    if !args.symbols.is_empty() {
        let table = SymbolTable::build(&binding, &args.symbols)
            .context("Required export missing")?;
        report::print_symbols(&table);
    }

    let entry = binding.entry().context("Failed to resolve the global commands")?;
    report::print_entry(&entry, args.layer_extensions)?;

    Ok(())
}
