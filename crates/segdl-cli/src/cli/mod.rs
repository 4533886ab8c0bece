//! CLI for segdl.

mod download;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use segdl_core::config::{self, SegdlConfig};
use segdl_core::downloader::PipelineConfig;
use segdl_core::logging;
use std::path::PathBuf;

/// Download a segmented video by scraping its watch page or from a segment URL template.
#[derive(Debug, Parser)]
#[command(name = "segdl", version)]
#[command(about = "segdl: parallel numbered-segment video downloader", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["url", "segurl"])))]
pub struct Cli {
    /// Watch page to scrape for the media URL.
    #[arg(long, value_name = "PAGE")]
    pub url: Option<String>,

    /// Segment URL template; the placeholder is replaced by the segment number.
    #[arg(long, value_name = "TEMPLATE")]
    pub segurl: Option<String>,

    /// Number of concurrent fetchers (config default: 10).
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// First segment number to fetch (config default: 1).
    #[arg(long, value_name = "ID")]
    pub start: Option<u64>,

    /// Print every candidate URL found on the page and enable debug logging.
    #[arg(long)]
    pub show: bool,

    /// Output file. Derived from the media URL when omitted.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Placeholder token in --segurl (config default: "{seg}").
    #[arg(long, value_name = "TOKEN")]
    pub placeholder: Option<String>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        logging::init_logging(cli.show);
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        download::run(cli, &cfg).await
    }

    /// Config pipeline settings with `--threads` and `--start` applied.
    fn pipeline_config(&self, cfg: &SegdlConfig) -> PipelineConfig {
        let mut pipeline = cfg.pipeline();
        if let Some(threads) = self.threads {
            pipeline.workers = threads;
        }
        if let Some(start) = self.start {
            pipeline.start_id = start;
        }
        pipeline
    }

    fn placeholder<'a>(&'a self, cfg: &'a SegdlConfig) -> &'a str {
        self.placeholder.as_deref().unwrap_or(&cfg.placeholder)
    }
}
