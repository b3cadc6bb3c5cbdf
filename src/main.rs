use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use homedir::my_home;
use serde_json::json;
use tracing_subscriber::EnvFilter;

mod catalog;
mod cli;
mod compose;
mod config;
mod recommender;
mod rerank;
mod semantic;
#[cfg(test)]
mod tests;
mod types;

use catalog::Catalog;
use config::Config;
use recommender::Recommender;
use rerank::Reranker;
use semantic::IndexKind;

fn base_path(arg: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = arg {
        return Ok(path);
    }

    if let Ok(path) = std::env::var("ASSESSREC_HOME") {
        return Ok(PathBuf::from(path));
    }

    let home = my_home()
        .map_err(|e| anyhow::anyhow!("Could not determine home directory: {e:?}"))?
        .context("Home directory path is empty")?;
    Ok(home.join(".local/share/assessrec"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    let base_path = base_path(args.base_path)?;
    let mut config = Config::load_with(&base_path)
        .with_context(|| format!("failed to load config from {}", base_path.display()))?;

    match args.command {
        cli::Command::Recommend {
            query,
            k,
            catalog,
            no_rerank,
        } => {
            let query = query.trim();
            if query.is_empty() {
                bail!("Query must not be empty");
            }

            if let Some(catalog) = catalog {
                config.override_catalog_path(&catalog)?;
            }
            if no_rerank {
                config.rerank.enabled = false;
            }

            let recommender = Recommender::setup(&config, &base_path)
                .context("failed to set up recommender")?;
            log::info!(
                "ready items={} index={} encoder={} reranker={}",
                recommender.catalog().len(),
                recommender.index_kind().as_str(),
                recommender.encoder_name(),
                recommender.reranker_name()
            );

            let recs = recommender.recommend(query, k)?;

            println!("{}", serde_json::to_string_pretty(&recs)?);
            Ok(())
        }

        cli::Command::Inspect { catalog } => {
            if let Some(catalog) = catalog {
                config.override_catalog_path(&catalog)?;
            }

            let catalog_path = config.catalog_path();
            let catalog = Catalog::load(&catalog_path)?;
            let reranker = Reranker::from_config(&config.rerank);

            let report = json!({
                "catalog_path": catalog_path,
                "items": catalog.len(),
                "type_codes": catalog.type_codes(),
                "encoder": config.embedding.model,
                "index": IndexKind::detect(config.index).as_str(),
                "reranker": reranker.name(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}
