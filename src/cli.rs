// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::dispatch_request::{split_queries, DispatchRequest};
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "scrapectl", version, about = "Client and orchestrator for a scraping task backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL (overrides `backend.base_url`)
    #[arg(long, global = true, env = "DEFAULT_API_URL")]
    pub api_url: Option<String>,

    /// Use an already running backend instead of starting one
    #[arg(long, global = true, default_value_t = false)]
    pub external: bool,

    /// Do not write diagnostic response files
    #[arg(long, global = true, default_value_t = false)]
    pub no_response_files: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one scrape synchronously
    Run(PayloadArgs),
    /// Accept scrape requests over HTTP
    Serve(ServeArgs),
    /// Check whether the backend is reachable
    Health,
    /// Watch the response directory for a file
    Watch(WatchArgs),
}

/// 抓取负载参数，未显式传入时从环境变量读取
#[derive(ClapArgs, Debug, Clone)]
pub struct PayloadArgs {
    #[arg(long, env = "API_KEY", default_value = "")]
    pub api_key: String,

    /// Queries, separated by commas
    #[arg(long, env = "QUERIES", default_value = "Barbershop in Montreal")]
    pub queries: String,

    #[arg(long, env = "COUNTRY")]
    pub country: Option<String>,

    #[arg(long, env = "BUSINESS_TYPE", default_value = "")]
    pub business_type: String,

    #[arg(long, env = "MAX_CITIES")]
    pub max_cities: Option<u32>,

    #[arg(long, env = "RANDOMIZE_CITIES", default_value = "true", value_parser = parse_flag, action = ArgAction::Set)]
    pub randomize_cities: bool,

    #[arg(long, env = "ENABLE_REVIEWS_EXTRACTION", default_value = "false", value_parser = parse_flag, action = ArgAction::Set)]
    pub enable_reviews_extraction: bool,

    #[arg(long, env = "MAX_REVIEWS", default_value_t = 20)]
    pub max_reviews: u32,

    #[arg(long, env = "REVIEWS_SORT", default_value = "newest")]
    pub reviews_sort: String,

    #[arg(long, env = "SCRAPE_LANG")]
    pub lang: Option<String>,

    #[arg(long, env = "MAX_RESULTS")]
    pub max_results: Option<u32>,

    #[arg(long, env = "COORDINATES", default_value = "")]
    pub coordinates: String,

    #[arg(long, env = "ZOOM_LEVEL", default_value_t = 14)]
    pub zoom_level: u32,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "WEBHOOK_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "WEBHOOK_PORT")]
    pub port: Option<u16>,

    /// Number of dispatch workers
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct WatchArgs {
    /// File name to watch inside the response directory
    #[arg(long, default_value = "all-task-1.json")]
    pub file: String,

    /// Directory to watch (defaults to `backend.response_dir`)
    #[arg(long)]
    pub dir: Option<String>,

    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
}

/// 解析 true/1/yes 风格的布尔值
fn parse_flag(value: &str) -> Result<bool, String> {
    Ok(matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes"
    ))
}

fn non_blank(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}

/// 只包含负载参数的解析器，用于未指定子命令时
#[derive(Parser, Debug)]
struct PayloadOnly {
    #[command(flatten)]
    args: PayloadArgs,
}

impl PayloadArgs {
    /// 只从环境变量和默认值构建参数
    pub fn from_env() -> Self {
        PayloadOnly::parse_from(["scrapectl"]).args
    }

    pub fn into_request(self) -> DispatchRequest {
        DispatchRequest {
            queries: split_queries(&self.queries),
            country: self.country.and_then(non_blank),
            business_type: non_blank(self.business_type),
            max_cities: self.max_cities,
            randomize_cities: Some(self.randomize_cities),
            api_key: non_blank(self.api_key),
            enable_reviews_extraction: Some(self.enable_reviews_extraction),
            max_reviews: Some(self.max_reviews),
            reviews_sort: non_blank(self.reviews_sort),
            lang: self.lang.and_then(non_blank),
            max_results: self.max_results,
            coordinates: non_blank(self.coordinates),
            zoom_level: Some(self.zoom_level),
        }
    }
}

impl Cli {
    /// 把命令行覆盖项合并进配置
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(url) = &self.api_url {
            settings.backend.base_url = url.clone();
        }
        if self.no_response_files {
            settings.backend.create_response_files = false;
        }

        if let Some(Commands::Serve(serve)) = &self.command {
            if let Some(host) = &serve.host {
                settings.webhook.host = host.clone();
            }
            if let Some(port) = serve.port {
                settings.webhook.port = port;
            }
            if let Some(workers) = serve.workers {
                settings.dispatch.workers = workers;
            }
        }
    }
}
