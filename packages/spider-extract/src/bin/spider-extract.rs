//! Command-line front end for the extraction pipeline.
//!
//! Runs the pipeline over local files instead of a live crawl, which is
//! handy for inspecting a saved page or a downloaded script bundle.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use spider_extract::{
    scan, Archive, ArchiveSink, Callback, CrawlConfig, ExtractionConfig, ExtractionPipeline,
    GitArchive, IterSource, PageRecord,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(Parser)]
#[command(name = "spider-extract")]
#[command(about = "Extract comments, JavaScript strings, paths and URLs from saved pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the extraction pipeline over local files
    Scan {
        /// What to extract
        #[arg(long, value_enum, default_value_t = Kind::Strings)]
        kind: Kind,

        /// Prefix each value with the URL of the page it came from
        #[arg(long)]
        with_origin: bool,

        /// Print one JSON object per line
        #[arg(long)]
        json: bool,

        /// Content type for every file, instead of guessing from the extension
        #[arg(long)]
        content_type: Option<String>,

        /// `<script type=...>` values treated as JavaScript
        #[arg(long = "script-type")]
        script_types: Vec<String>,

        /// Also scan `<script>` elements without a type
        #[arg(long)]
        untyped_scripts: bool,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Copy local files into an archive directory
    Archive {
        /// Archive root directory
        root: PathBuf,

        /// URL the file names are resolved against
        #[arg(long)]
        base_url: Option<Url>,

        /// Stage and commit the files in a git repository
        #[arg(long)]
        git: bool,

        /// Commit message (with --git)
        #[arg(long, default_value = "Archived pages")]
        message: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Javascript,
    Strings,
    Paths,
    RelativePaths,
    AbsolutePaths,
    Urls,
    Comments,
    HtmlComments,
    JsComments,
    Spans,
}

#[derive(Serialize)]
struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    value: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            kind,
            with_origin,
            json,
            content_type,
            script_types,
            untyped_scripts,
            files,
        } => {
            let pages = files
                .iter()
                .map(|path| load_page(path, content_type.as_deref()))
                .collect::<Result<Vec<_>>>()?;

            if kind == Kind::Spans {
                return print_spans(&pages, json);
            }

            let mut config = ExtractionConfig::new().with_untyped_scripts(untyped_scripts);
            if !script_types.is_empty() {
                config = config.with_script_types(script_types);
            }

            let records = scan_pages(pages, kind, with_origin, config).await?;
            for record in &records {
                print_record(record, json)?;
            }
        }

        Commands::Archive {
            root,
            base_url,
            git,
            message,
            files,
        } => {
            let pages = files
                .iter()
                .map(|path| {
                    let body = std::fs::read(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    Ok((archive_url(path, base_url.as_ref())?, body))
                })
                .collect::<Result<Vec<_>>>()?;

            if git {
                let archive = GitArchive::open(&root)
                    .with_context(|| format!("Failed to open git archive {}", root.display()))?;
                let written = archive.commit_with(&message, |archive| {
                    pages
                        .iter()
                        .map(|(url, body)| archive.write(url, body))
                        .collect::<Result<Vec<_>, _>>()
                })?;
                print_paths(&written);
            } else {
                let mut archive = Archive::open(&root)
                    .with_context(|| format!("Failed to open archive {}", root.display()))?;
                let written = write_all(&mut archive, &pages)?;
                print_paths(&written);
            }
        }
    }

    Ok(())
}

async fn scan_pages(
    pages: Vec<PageRecord>,
    kind: Kind,
    with_origin: bool,
    config: ExtractionConfig,
) -> Result<Vec<Record>> {
    let records = RefCell::new(Vec::new());

    let callback = if with_origin {
        Callback::with_page(|value: &str, page: &PageRecord| {
            records.borrow_mut().push(Record {
                url: Some(page.url.to_string()),
                value: value.to_string(),
            })
        })
    } else {
        Callback::value(|value: &str| {
            records.borrow_mut().push(Record {
                url: None,
                value: value.to_string(),
            })
        })
    };

    let mut pipeline = ExtractionPipeline::new()
        .with_config(config)
        .with_crawl_config(CrawlConfig::from_env()?);

    match kind {
        Kind::Javascript => pipeline.every_javascript(callback),
        Kind::Strings => pipeline.every_javascript_string(callback),
        Kind::Paths => pipeline.every_javascript_path_string(callback),
        Kind::RelativePaths => pipeline.every_javascript_relative_path_string(callback),
        Kind::AbsolutePaths => pipeline.every_javascript_absolute_path_string(callback),
        Kind::Urls => pipeline.every_javascript_url_string(callback),
        Kind::Comments => pipeline.every_comment(callback),
        Kind::HtmlComments => pipeline.every_html_comment(callback),
        Kind::JsComments => pipeline.every_javascript_comment(callback),
        // Spans bypass the pipeline.
        Kind::Spans => return Ok(Vec::new()),
    };

    let stats = pipeline.run(&mut IterSource::new(pages)).await?;
    tracing::info!(pages = stats.pages, strings = stats.javascript_strings, "Scan complete");
    drop(pipeline);

    Ok(records.into_inner())
}

fn load_page(path: &Path, content_type: Option<&str>) -> Result<PageRecord> {
    let body = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let content_type = match content_type {
        Some(ct) => ct.to_string(),
        None => mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    };

    Ok(PageRecord::new(file_url(path)?, body).with_content_type(content_type))
}

fn file_url(path: &Path) -> Result<Url> {
    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    Url::from_file_path(&absolute)
        .map_err(|_| anyhow::anyhow!("Cannot build a file URL for {}", absolute.display()))
}

fn archive_url(path: &Path, base_url: Option<&Url>) -> Result<Url> {
    match base_url {
        Some(base) => {
            let name = path
                .file_name()
                .context("File has no name")?
                .to_string_lossy();
            base.join(&name)
                .with_context(|| format!("Cannot resolve {} against {}", name, base))
        }
        None => file_url(path),
    }
}

fn write_all(sink: &mut impl ArchiveSink, pages: &[(Url, Vec<u8>)]) -> Result<Vec<PathBuf>> {
    pages
        .iter()
        .map(|(url, body)| sink.write(url, body).map_err(anyhow::Error::from))
        .collect()
}

fn print_record(record: &Record, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(record)?);
    } else {
        match &record.url {
            Some(url) => println!("{}\t{}", url, record.value),
            None => println!("{}", record.value),
        }
    }
    Ok(())
}

fn print_spans(pages: &[PageRecord], json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct SpanRecord<'a> {
        url: &'a str,
        kind: spider_extract::SpanKind,
        start: usize,
        end: usize,
        text: &'a str,
    }

    for page in pages {
        let text = page.text();
        for span in scan(&text) {
            if json {
                let record = SpanRecord {
                    url: page.url.as_str(),
                    kind: span.kind,
                    start: span.start,
                    end: span.end,
                    text: span.text,
                };
                println!("{}", serde_json::to_string(&record)?);
            } else {
                println!("{:?}\t{}\t{}\t{:?}", span.kind, span.start, span.end, span.text);
            }
        }
    }
    Ok(())
}

fn print_paths(paths: &[PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}
