//! Resolve the media URL, then either print it (direct file) or run the segment pipeline.

use super::Cli;
use anyhow::{Context, Result};
use segdl_core::config::SegdlConfig;
use segdl_core::downloader::{run_pipeline, PipelineError, PipelineReport};
use segdl_core::resolver::{self, ResolvedMedia};
use segdl_core::transport::CurlTransport;
use segdl_core::url_model::{output_file_name, SegmentUrl, DEFAULT_PLACEHOLDER};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What to do with a resolved media URL.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Plan {
    /// A single file: report its URL, nothing to assemble.
    Direct(String),
    /// A segment template to fetch into `output`.
    Segmented { template: SegmentUrl, output: PathBuf },
}

impl Plan {
    pub(super) fn new(
        media: ResolvedMedia,
        placeholder: &str,
        output: Option<&Path>,
    ) -> Result<Self> {
        if !media.chunked {
            return Ok(Plan::Direct(media.url));
        }
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(output_file_name(&media.url)));
        let template = SegmentUrl::with_placeholder(media.url, placeholder)
            .context("invalid segment url template")?;
        Ok(Plan::Segmented { template, output })
    }
}

pub(super) async fn run(cli: Cli, cfg: &SegdlConfig) -> Result<()> {
    let transport = CurlTransport::new(cfg.curl_options());

    // Resolved templates always use the default placeholder.
    let (media, placeholder) = match (&cli.segurl, &cli.url) {
        (Some(template), _) => (
            ResolvedMedia::segment_template(template.clone()),
            cli.placeholder(cfg).to_string(),
        ),
        (None, Some(page)) => (
            resolver::resolve_page(&transport, page, cli.show).await?,
            DEFAULT_PLACEHOLDER.to_string(),
        ),
        (None, None) => anyhow::bail!("either --url or --segurl is required"),
    };

    let (template, output) = match Plan::new(media, &placeholder, cli.output.as_deref())? {
        Plan::Direct(url) => {
            println!("Is not chunked, direct url: {url}");
            return Ok(());
        }
        Plan::Segmented { template, output } => (template, output),
    };
    let pipeline = cli.pipeline_config(cfg);

    tracing::info!(
        template = %template,
        output = %output.display(),
        workers = pipeline.workers,
        start = pipeline.start_id,
        "starting segmented download"
    );

    match run_pipeline(template, Arc::new(transport), &output, &pipeline).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(PipelineError::Aborted { cause, report }) => {
            print_report(&report);
            Err(anyhow::Error::new(cause).context("download aborted"))
        }
        Err(err) => Err(err.into()),
    }
}

fn print_report(report: &PipelineReport) {
    let agg = &report.aggregate;
    match agg.last_written_id {
        Some(last) => println!(
            "{}: {} segments, {} bytes (last segment {})",
            report.output.display(),
            agg.segments_written,
            agg.bytes_written,
            last
        ),
        None => println!("{}: nothing written", report.output.display()),
    }
    if let Some(missing) = agg.first_missing_id.filter(|_| !report.is_complete()) {
        println!(
            "  incomplete: segment {} never arrived, {} later segments dropped",
            missing, agg.stranded
        );
    }
    let retries = &report.retries;
    if retries.transport + retries.throttled + retries.unexpected > 0 {
        println!(
            "  retries: transport {}, throttled {}, status {}",
            retries.transport, retries.throttled, retries.unexpected
        );
    }
}
