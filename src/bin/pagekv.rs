//! pagekv CLI
//!
//! Build a store from a directory of files, query it, inspect its index.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pagekv::{Builder, DuplicatePolicy, Lookup, StoreConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// pagekv CLI
#[derive(Parser, Debug)]
#[command(name = "pagekv")]
#[command(about = "Static write-once/read-many key-value file store")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a store: every regular file in DIR becomes one entry keyed by its name
    Build {
        /// Store file to create (truncated if it exists)
        store: PathBuf,

        /// Directory with the payload files
        dir: PathBuf,

        /// Fail on repeated keys instead of keeping the last one
        #[arg(long)]
        strict: bool,

        /// fsync the store before exiting
        #[arg(long)]
        sync: bool,
    },

    /// Print the payload stored under a key
    Get {
        /// Store file
        store: PathBuf,

        /// The key to get
        key: String,

        /// Write the payload to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the index layout of a store
    Stat {
        /// Store file
        store: PathBuf,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,pagekv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let outcome = match args.command {
        Commands::Build {
            store,
            dir,
            strict,
            sync,
        } => build(&store, &dir, strict, sync),
        Commands::Get { store, key, output } => get(&store, &key, output.as_deref()),
        Commands::Stat { store } => stat(&store),
    };

    if let Err(e) = outcome {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn build(store: &Path, dir: &Path, strict: bool, sync: bool) -> pagekv::Result<()> {
    let policy = if strict {
        DuplicatePolicy::Reject
    } else {
        DuplicatePolicy::KeepLast
    };
    let config = StoreConfig::builder()
        .duplicate_policy(policy)
        .sync_on_close(sync)
        .build();

    let mut builder = Builder::with_config(store, config)?;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(key) = path.file_name().and_then(|name| name.to_str()) else {
            tracing::warn!("skipping non UTF-8 file name: {}", path.display());
            continue;
        };
        let payload = fs::read(&path)?;
        if payload.is_empty() {
            tracing::warn!("skipping empty file: {}", path.display());
            continue;
        }
        builder.put(key, &payload)?;
    }

    let summary = builder.close()?;
    println!(
        "{}: {} entries, {} pages, {} bytes",
        summary.path.display(),
        summary.entry_count,
        summary.page_count,
        summary.file_size
    );
    Ok(())
}

fn get(store: &Path, key: &str, output: Option<&Path>) -> pagekv::Result<()> {
    let mut lookup = Lookup::open(store)?;
    let Some(payload) = lookup.get(key)? else {
        eprintln!("{}: not found", key);
        std::process::exit(2);
    };

    match output {
        Some(path) => fs::write(path, &payload)?,
        None => std::io::stdout().write_all(&payload)?,
    }
    lookup.close()
}

fn stat(store: &Path) -> pagekv::Result<()> {
    let lookup = Lookup::open(store)?;
    println!("store:            {}", lookup.underlying_path().display());
    println!("pages:            {}", lookup.page_count());
    println!("directory offset: {}", lookup.directory_offset());

    let offsets = lookup.page_offsets();
    let keys = lookup.boundary_keys();
    for (i, offset) in offsets.iter().enumerate() {
        match keys.get(i) {
            Some(boundary) => println!("  page {:>5} @ {:>12}  < {:?}", i, offset, boundary),
            None => println!("  page {:>5} @ {:>12}", i, offset),
        }
    }
    lookup.close()
}
