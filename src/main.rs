//! Main entry point for the pageflip CLI application.
//!
//! Opens a comic archive from a local path or HTTP URL and either lists its
//! pages, writes one page to stdout, exports every page, or reads navigation
//! commands from stdin.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pageflip::{
    Cli, HttpRangeReader, LocalFileReader, NavError, Page, PageSource, PageView, ReadAt, Viewer,
    ZipArchive,
};

/// Application entry point.
///
/// Parses command-line arguments, sets up logging, and dispatches on whether
/// the archive is local or remote.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    if cli.is_http_url() {
        let reader = Arc::new(HttpRangeReader::new(cli.file.clone()).await?);
        run(reader.clone(), &cli).await?;

        if !cli.is_quiet() {
            eprintln!(
                "\nTotal bytes transferred: {}",
                format_size(reader.transferred_bytes())
            );
        }
    } else {
        let reader = Arc::new(LocalFileReader::new(Path::new(&cli.file))?);
        run(reader, &cli).await?;
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` or the `-q` level.
fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Open the archive and run the mode selected on the command line.
async fn run<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    let archive = ZipArchive::open(reader).await?;
    let mut viewer = Viewer::open(archive).await?;

    if cli.list || cli.verbose {
        list_pages(&viewer, cli.verbose);
    } else if let Some(page) = &cli.page {
        print_page(&mut viewer, page).await?;
    } else if let Some(dir) = &cli.export_dir {
        export_pages(&viewer, Path::new(dir), cli).await?;
    } else {
        read_interactively(&mut viewer, cli).await?;
    }

    viewer.close();
    Ok(())
}

/// List pages in reading order.
///
/// The verbose format adds a header, the stored size of every page and a
/// summary line.
fn list_pages<R: ReadAt + 'static>(viewer: &Viewer<ZipArchive<R>>, verbose: bool) {
    if verbose {
        println!("{:>5}  {:>10}  {:>10}  Name", "Page", "Length", "Size");
        println!("{}", "-".repeat(60));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut locked = 0usize;

    for (i, page) in viewer.pages().iter().enumerate() {
        let marker = if page.is_readable() { "" } else { "  [locked]" };
        if !page.is_readable() {
            locked += 1;
        }

        if !verbose {
            println!("{:>5}  {}{}", i + 1, page.key(), marker);
            continue;
        }

        let (length, size) = viewer
            .source()
            .entry(page.key())
            .map(|e| (e.uncompressed_size, e.compressed_size))
            .unwrap_or_default();
        total_uncompressed += length;
        total_compressed += size;
        println!("{:>5}  {:>10}  {:>10}  {}{}", i + 1, length, size, page.key(), marker);
    }

    if verbose {
        println!("{}", "-".repeat(60));
        println!(
            "{:>5}  {:>10}  {:>10}  {} pages, {} locked",
            "",
            total_uncompressed,
            total_compressed,
            viewer.pages().len(),
            locked
        );
    }
}

/// Write one page, chosen by its 1-based number, to stdout.
async fn print_page<R: ReadAt + 'static>(
    viewer: &mut Viewer<ZipArchive<R>>,
    page_number: &str,
) -> Result<()> {
    if let Some(page) = viewer.jump(page_number).await? {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&page.bytes).await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Export readable pages in reading order as `NNNN_<name>` files.
async fn export_pages<R: ReadAt + 'static>(
    viewer: &Viewer<ZipArchive<R>>,
    dir: &Path,
    cli: &Cli,
) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;

    for (i, page) in viewer.pages().iter().enumerate() {
        if !page.is_readable() {
            warn!(page = i + 1, key = page.key(), "skipping unreadable page");
            continue;
        }

        let output_path = export_path(dir, i, page.key());
        if output_path.exists() && !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", output_path.display());
            }
            continue;
        }

        if !cli.is_quiet() {
            println!("  exporting: {}", output_path.display());
        }

        let bytes = viewer.source().read(page.key()).await?;
        tokio::fs::write(&output_path, bytes).await?;
    }

    Ok(())
}

/// Output path for the page at `index`, keeping only the entry's base name.
fn export_path(dir: &Path, index: usize, key: &str) -> PathBuf {
    let name = Path::new(key)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| key.replace('/', "_"));
    dir.join(format!("{:04}_{}", index + 1, name))
}

/// Read navigation commands from stdin until `q` or end of input.
///
/// `n`/empty line, `p`, `f` and `l` step through the pages; anything else is
/// taken as a page number.
async fn read_interactively<R: ReadAt + 'static>(
    viewer: &mut Viewer<ZipArchive<R>>,
    cli: &Cli,
) -> Result<()> {
    let result = viewer.current().await;
    report(viewer.view(), result, cli);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let result = match line.trim() {
            "q" | "quit" => break,
            "" | "n" | "next" => viewer.next().await,
            "p" | "prev" => viewer.prev().await,
            "f" | "first" => viewer.first().await,
            "l" | "last" => viewer.last().await,
            number => viewer.jump(number).await,
        };
        report(viewer.view(), result, cli);
    }

    Ok(())
}

/// Print the outcome of one navigation step.
///
/// Ignored moves print nothing. An unreadable page still prints its position
/// since the navigator has moved onto it.
fn report(view: Option<PageView>, result: Result<Option<Page>, NavError>, cli: &Cli) {
    match result {
        Ok(Some(page)) => println!("{}", status_line(&page.view, Some(page.bytes.len()))),
        Ok(None) => {}
        Err(e @ NavError::PageUnreadable { .. }) => {
            if let Some(view) = view {
                println!("{}", status_line(&view, None));
            }
            eprintln!("Warning: {e}");
        }
        Err(e) => {
            if !cli.is_very_quiet() {
                eprintln!("Error: {e}");
            }
        }
    }
}

fn status_line(view: &PageView, size: Option<usize>) -> String {
    let mut line = format!("{}/{}  {}", view.display_index, view.count, view.current_key);
    match size {
        Some(size) => line.push_str(&format!("  ({})", format_size(size as u64))),
        None => line.push_str("  [locked]"),
    }
    if view.is_at_first {
        line.push_str("  [first]");
    }
    if view.is_at_last {
        line.push_str("  [last]");
    }
    line
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
