// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use clap::Parser;
use scrapectl::cli::{Cli, Commands, PayloadArgs};
use scrapectl::config::settings::Settings;
use scrapectl::infrastructure::metrics::init_metrics;
use scrapectl::infrastructure::watcher::{LoggingFileSink, ResponseWatcher};
use scrapectl::orchestrator::{Orchestrator, RunMode};
use scrapectl::utils::shutdown::wait_for_shutdown_signal;
use scrapectl::utils::telemetry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 主函数
///
/// 解析命令行、加载配置，然后按子命令运行
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();

    // 2. Load configuration
    let cli = Cli::parse();
    let mut settings = Settings::new()?;
    cli.apply_overrides(&mut settings);
    info!(api_url = %settings.backend.base_url, "Configuration loaded");

    init_metrics(&settings.metrics);

    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| Commands::Run(PayloadArgs::from_env()));
    let supervise = !cli.external;

    match command {
        Commands::Run(args) => {
            let orchestrator = Orchestrator::new(settings, supervise);
            orchestrator.run(RunMode::Single(args.into_request())).await
        }
        Commands::Serve(_) => {
            let orchestrator = Orchestrator::new(settings, supervise);
            orchestrator.run(RunMode::Serve).await
        }
        Commands::Health => {
            let orchestrator = Orchestrator::new(settings, false);
            let ready = orchestrator.prober()?.wait_until_ready().await?;
            if ready {
                info!("API is running");
                Ok(())
            } else {
                error!("API is reachable but not ready");
                anyhow::bail!("API is not ready")
            }
        }
        Commands::Watch(args) => {
            let directory = args
                .dir
                .unwrap_or_else(|| settings.backend.response_dir.clone());
            let watcher = ResponseWatcher::new(
                directory,
                args.file,
                Duration::from_millis(args.interval_ms),
                Arc::new(LoggingFileSink::default()),
            );
            watcher.run(wait_for_shutdown_signal()).await?;
            Ok(())
        }
    }
}
