//! Main entry point for the cbxs-extract CLI application.
//!
//! Extracts CBXS streaming archives from the local filesystem or from
//! remote HTTP URLs.

use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::Path;
use std::sync::Arc;

use cbxs_extract::{
    Cli, FileListing, HttpRangeReader, LocalFileReader, LogReporter, ReadAt, StreamExtractor,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .format_target(false)
        .parse_default_env()
        .init();

    if cli.is_http_url() {
        let reader = HttpRangeReader::new(cli.archive.clone()).await?;
        let transferred_before = reader.transferred_bytes();
        let reader = Arc::new(reader);

        process_archive(reader.clone(), &cli).await?;

        if !cli.is_quiet() {
            let transferred = reader.transferred_bytes() - transferred_before;
            eprintln!(
                "\nTotal bytes transferred: {} in {} request(s)",
                format_size(transferred),
                reader.request_count()
            );
        }
    } else {
        let reader = Arc::new(LocalFileReader::new(Path::new(&cli.archive))?);
        process_archive(reader, &cli).await?;
    }

    Ok(())
}

/// List or extract the archive according to the CLI options.
async fn process_archive<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    let extractor = StreamExtractor::new(reader, cli.options(), Arc::new(LogReporter));

    if cli.list {
        print_listing(&extractor.list().await?);
    } else if let Some(dir) = &cli.output_dir {
        let summary = extractor.extract_to_dir(Path::new(dir)).await?;
        if summary.skipped > 0 {
            info!("{} file(s) skipped", summary.skipped);
        }
    }

    Ok(())
}

/// Print a table of logical files with their sub-resources indented below.
fn print_listing(files: &[FileListing]) {
    println!(
        "{:>5}  {:>10}  {:>6}  {:>10}  Name",
        "File", "Offset", "Chunks", "Size"
    );
    println!("{}", "-".repeat(60));

    let mut total_size = 0usize;
    let mut total_resources = 0usize;

    for file in files {
        println!(
            "{:>5}  {:>#10x}  {:>6}  {:>10}  {}",
            file.index, file.offset, file.chunks, file.size, file.file_name
        );
        for resource in &file.resources {
            println!(
                "{:>5}  {:>#10x}  {:>6}  {:>10}    {}",
                "", resource.offset, "", resource.size, resource.file_name
            );
        }
        total_size += file.size;
        total_resources += file.resources.len();
    }

    println!("{}", "-".repeat(60));
    println!(
        "{:>5}  {:>10}  {:>6}  {:>10}  {} resources",
        files.len(),
        "",
        "",
        format_size(total_size as u64),
        total_resources
    );
}

/// Format a byte size into a human-readable string.
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
