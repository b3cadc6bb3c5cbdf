use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Base directory for config, catalog and model cache.
    /// Defaults to $ASSESSREC_HOME or ~/.local/share/assessrec
    #[clap(long, global = true)]
    pub base_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recommend assessments for a query or job description
    Recommend {
        /// Free-text query or job description
        query: String,

        /// Number of recommendations (clamped to 5..=10)
        #[clap(short, long, default_value = "10")]
        k: usize,

        /// Catalog file, overrides config
        #[clap(long)]
        catalog: Option<PathBuf>,

        /// Skip the external relevance reranker
        #[clap(long, default_value = "false")]
        no_rerank: bool,
    },

    /// Show catalog, encoder, index and reranker details
    Inspect {
        /// Catalog file, overrides config
        #[clap(long)]
        catalog: Option<PathBuf>,
    },
}
