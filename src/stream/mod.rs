//! CBXS streaming archive reading and extraction.
//!
//! ## Architecture
//!
//! - [`structures`]: wire-level headers (chunk framing, interleaved records)
//! - [`reader`]: chunk reader that reassembles logical files
//! - [`demux`]: splits a logical file into its sub-resources
//! - [`extractor`]: drives the pipeline and writes the results
//!
//! ## Format Overview
//!
//! A streaming archive is a sequence of framed, independently compressed
//! chunks:
//! 1. `CBXS` chunks carry RefPack-compressed pieces of a logical file
//! 2. A `CEND` chunk carries the last piece and completes the file
//! 3. Decompressed chunks are concatenated in stream order
//!
//! Each logical file in turn packs sub-resources (shapes, lightmaps, audio
//! banks, ...) back to back, each behind an 8-byte record header.
//!
//! ## Limitations
//!
//! - Little-endian record headers only; big-endian (GameCube) streams are
//!   not supported

mod demux;
mod extractor;
mod reader;
mod structures;

pub use demux::{Demuxer, SubResource};
pub use extractor::{ExtractSummary, FileListing, ResourceListing, StreamExtractor};
pub use reader::{LogicalFile, StreamReader};
pub use structures::*;
