use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

use crate::config::ExtractOptions;
use crate::error::{ExtractError, Result};
use crate::io::ReadAt;
use crate::report::{Event, Reporter};

use super::demux::Demuxer;
use super::reader::{LogicalFile, StreamReader};
use super::structures::ResourceType;

/// Sub-resource entry of a [`FileListing`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceListing {
    pub offset: usize,
    pub resource_id: u32,
    pub resource_type: ResourceType,
    pub size: usize,
    /// Name the resource is written under
    pub file_name: String,
}

/// Logical file entry produced by [`StreamExtractor::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileListing {
    pub index: usize,
    pub offset: u64,
    pub chunks: usize,
    pub size: usize,
    /// Name the raw file is written under
    pub file_name: String,
    pub resources: Vec<ResourceListing>,
}

/// Totals of an extraction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub resources: usize,
    pub skipped: usize,
}

/// Streaming archive extractor
pub struct StreamExtractor<R: ReadAt> {
    reader: Arc<R>,
    options: ExtractOptions,
    reporter: Arc<dyn Reporter>,
}

impl<R: ReadAt> StreamExtractor<R> {
    pub fn new(reader: Arc<R>, options: ExtractOptions, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            reader,
            options,
            reporter,
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    fn stream(&self) -> StreamReader<R> {
        StreamReader::new(self.reader.clone(), self.reporter.clone())
    }

    /// Decide whether an error stops the run or only the current file.
    fn absorb(&self, err: ExtractError, summary: &mut ExtractSummary) -> Result<()> {
        let file = match err.file() {
            Some(file) if self.options.keep_going => file,
            _ => return Err(err),
        };
        summary.skipped += 1;
        self.reporter.report(&Event::FileSkipped {
            file,
            reason: describe(&err),
        });
        Ok(())
    }

    /// List every logical file in the archive and its sub-resources
    pub async fn list(&self) -> Result<Vec<FileListing>> {
        let mut stream = self.stream();
        let mut listings = Vec::new();
        let mut summary = ExtractSummary::default();

        loop {
            let file = match stream.next_file().await {
                Ok(Some(file)) => file,
                Ok(None) => break,
                Err(e) => {
                    self.absorb(e, &mut summary)?;
                    continue;
                }
            };

            let mut resources = Vec::new();
            if self.options.demux {
                for record in Demuxer::new(file.index, &file.data, self.options.record_size) {
                    match record {
                        Ok(record) => resources.push(ResourceListing {
                            offset: record.offset,
                            resource_id: record.resource_id,
                            resource_type: record.resource_type,
                            size: record.payload.len(),
                            file_name: self
                                .options
                                .resource_file_name(record.resource_id, record.resource_type),
                        }),
                        Err(e) => self.absorb(e, &mut summary)?,
                    }
                }
            }

            listings.push(FileListing {
                index: file.index,
                offset: file.offset,
                chunks: file.chunks,
                size: file.data.len(),
                file_name: self.options.raw_file_name(file.index),
                resources,
            });
        }

        Ok(listings)
    }

    /// Extract every logical file, and its sub-resources, into `dir`
    ///
    /// For file `n` this writes `{prefix}n.bin` and, when demuxing is
    /// enabled, one file per sub-resource under `{prefix}n_uninterleaved/`.
    /// Files written before an error are kept.
    pub async fn extract_to_dir(&self, dir: &Path) -> Result<ExtractSummary> {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("could not create \"{}\"", dir.display()))?;

        let mut stream = self.stream();
        let mut summary = ExtractSummary::default();

        loop {
            let file = match stream.next_file().await {
                Ok(Some(file)) => file,
                Ok(None) => break,
                Err(e) => {
                    self.absorb(e, &mut summary)?;
                    continue;
                }
            };

            self.write_raw(&file, dir).await?;
            summary.files += 1;

            if self.options.demux {
                match self.write_resources(&file, dir, &mut summary).await {
                    Ok(()) => {}
                    Err(e) => self.absorb(e, &mut summary)?,
                }
            }
        }

        self.reporter.report(&Event::Finished {
            files: summary.files,
            resources: summary.resources,
        });
        Ok(summary)
    }

    async fn write_raw(&self, file: &LogicalFile, dir: &Path) -> Result<()> {
        let path = self.options.raw_file_path(dir, file.index);
        fs::write(&path, &file.data)
            .await
            .with_context(|| format!("could not write \"{}\"", path.display()))?;

        self.reporter.report(&Event::FileWritten {
            file: file.index,
            path,
        });
        Ok(())
    }

    async fn write_resources(
        &self,
        file: &LogicalFile,
        dir: &Path,
        summary: &mut ExtractSummary,
    ) -> Result<()> {
        let out_dir = self.options.resource_dir_path(dir, file.index);
        fs::create_dir_all(&out_dir)
            .await
            .with_context(|| format!("could not create \"{}\"", out_dir.display()))?;

        for record in Demuxer::new(file.index, &file.data, self.options.record_size) {
            let record = record?;
            let path = out_dir.join(
                self.options
                    .resource_file_name(record.resource_id, record.resource_type),
            );
            fs::write(&path, record.payload)
                .await
                .with_context(|| format!("could not write \"{}\"", path.display()))?;
            summary.resources += 1;

            self.reporter.report(&Event::ResourceWritten {
                file: file.index,
                resource_id: record.resource_id,
                resource_type: record.resource_type,
                size: record.payload.len(),
                path,
            });
        }
        Ok(())
    }
}

/// Render an error with its sources on one line.
fn describe(err: &ExtractError) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        out.push_str(": ");
        out.push_str(&e.to_string());
        source = e.source();
    }
    out
}
