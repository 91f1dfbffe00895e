use std::sync::Arc;

use anyhow::{Context, Result};
use newsroom_core::RunSummary;
use newsroom_engine::{
    CatalogFile, Credentials, JsonFileLedger, Pacing, Pipeline, PipelineConfig, Publisher,
    WordPressClient,
};
use newsroom_logging::{news_info, news_warn};

use crate::{Cli, Command};

pub async fn execute(cli: &Cli) -> Result<()> {
    // Checked before any network traffic so a misconfigured publish fails fast.
    let credentials = if cli.command.needs_credentials() {
        Some(Credentials::from_env().context("WordPress credentials")?)
    } else {
        None
    };

    let config = build_config(cli)?;
    let pipeline = Pipeline::new(config.clone());

    let summary = match (cli.command, credentials) {
        (Command::Fetch, _) => pipeline.fetch().await?.summary,
        (Command::Generate, _) => pipeline.generate().await?.1,
        (Command::Publish, Some(credentials)) => {
            let (mut ledger, mut publisher) = publish_handles(&pipeline, &config, credentials)?;
            let posts = pipeline.load_posts()?;
            news_info!("Found {} posts to publish", posts.len());
            pipeline.publish(posts, &mut ledger, &mut publisher).await?
        }
        (Command::Run, Some(credentials)) => {
            let (mut ledger, mut publisher) = publish_handles(&pipeline, &config, credentials)?;
            pipeline.run(&mut ledger, &mut publisher).await?
        }
        (command, None) => anyhow::bail!("{command:?} requires credentials"),
    };

    report(cli.command, summary);
    Ok(())
}

fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::default_with_data_dir(cli.data_dir.clone());
    if let Some(path) = &cli.catalog {
        let file = CatalogFile::load(path)?;
        news_info!("Loaded {} sources from {:?}", file.sources.len(), path);
        config = config.with_catalog_file(file);
    }
    if cli.no_delay {
        config.pacing = Pacing::none();
    }
    Ok(config)
}

fn publish_handles(
    pipeline: &Pipeline,
    config: &PipelineConfig,
    credentials: Credentials,
) -> Result<(JsonFileLedger, Publisher)> {
    let ledger = JsonFileLedger::open(&pipeline.store().ledger_path())?;
    let client = WordPressClient::new(credentials, &config.fetch)?;
    Ok((ledger, Publisher::new(Arc::new(client))))
}

fn report(command: Command, summary: RunSummary) {
    news_info!("{:?} finished: {}", command, summary);
    if summary.failed > 0 {
        news_warn!("{} items failed; see warnings above", summary.failed);
    }
}
