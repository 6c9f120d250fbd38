//! # cbxs-extract
//!
//! Extractor for CBXS streaming archives (`BAM.[x]SB` world streams).
//!
//! A streaming archive is a run of framed chunks, each compressed on its own
//! with RefPack. Chunks concatenate into logical files, closed by an end
//! marker, and every logical file packs typed sub-resources back to back.
//! This crate covers the three layers:
//!
//! - [`refpack`]: the chunk decompressor
//! - [`StreamReader`]: chunk framing and logical-file reassembly
//! - [`Demuxer`]: splitting a logical file into its sub-resources
//!
//! Archives can be read from the local filesystem or, through HTTP Range
//! requests, from a remote server.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use cbxs_extract::{ExtractOptions, LocalFileReader, LogReporter, StreamExtractor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new(Path::new("data/worlds/bam.xsb"))?);
//!     let extractor = StreamExtractor::new(reader, ExtractOptions::default(), Arc::new(LogReporter));
//!
//!     for file in extractor.list().await? {
//!         println!("{}: {} bytes, {} resources", file.file_name, file.size, file.resources.len());
//!     }
//!
//!     extractor.extract_to_dir(Path::new("out")).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod refpack;
pub mod report;
pub mod stream;

pub use cli::Cli;
pub use config::{ExtensionTable, ExtractOptions};
pub use error::ExtractError;
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use refpack::{CodecError, decompress};
pub use report::{Event, LogReporter, NullReporter, Reporter};
pub use stream::{
    Demuxer, ExtractSummary, FileListing, LogicalFile, RecordSizeMode, ResourceType,
    StreamExtractor, StreamReader, SubResource,
};
