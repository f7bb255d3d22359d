use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lsif_correlate::{BundlePersistence, Settings, WorkingTree, correlate, logging};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lsif-correlate")]
#[command(about = "Correlate LSIF dumps into queryable code intelligence bundles")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Config,

    /// Correlate an LSIF dump and write the bundle
    Correlate {
        /// Path to the LSIF dump (one JSON element per line)
        input: PathBuf,

        /// Repository checkout used to prune documents that do not exist
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Repository subdirectory the dump's project root corresponds to
        #[arg(long)]
        root: Option<String>,

        /// Dump identifier stamped on package records
        #[arg(long)]
        dump_id: Option<i64>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep documents even if they are missing from the repository
        #[arg(long)]
        no_prune: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load configuration, using defaults: {e}");
        Settings::default()
    });
    if cli.verbose {
        settings.logging.default = "debug".to_string();
    }
    logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)
                .map_err(|e| anyhow::anyhow!("{e}"))
                .context("failed to create configuration")?;
            println!("Created default configuration at: {}", path.display());
        }

        Commands::Config => {
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Correlate {
            input,
            repo,
            root,
            dump_id,
            output,
            no_prune,
        } => {
            if let Some(root) = root {
                settings.correlation.root = root;
            }
            if let Some(dump_id) = dump_id {
                settings.correlation.dump_id = dump_id;
            }
            if no_prune {
                settings.correlation.prune = false;
            }
            let output = output.unwrap_or_else(|| {
                settings
                    .storage
                    .output_dir
                    .join(settings.correlation.dump_id.to_string())
            });

            let file = File::open(&input)
                .with_context(|| format!("failed to open {}", input.display()))?;
            let tree = WorkingTree::new(&repo, settings.correlation.respect_gitignore);

            let (bundle, stats) = correlate(
                BufReader::new(file),
                &settings.correlation,
                &settings.grouping,
                &tree,
            )
            .with_context(|| format!("failed to correlate {}", input.display()))?;

            let metadata = BundlePersistence::new(output.clone())
                .save(settings.correlation.dump_id, &bundle, &stats)
                .context("failed to save bundle")?;

            println!(
                "Correlated {} documents into {} result chunks ({} pruned) in {}ms",
                metadata.document_count,
                metadata.num_result_chunks,
                stats.pruned_documents,
                stats.elapsed_ms
            );
            println!("Bundle written to {}", output.display());
        }
    }

    Ok(())
}
