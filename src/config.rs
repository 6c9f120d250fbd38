//! Owned extraction settings: output naming and record layout policy.

use std::path::PathBuf;

use crate::stream::{RecordSizeMode, ResourceType};

/// Maps sub-resource types to output file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionTable {
    entries: Vec<(ResourceType, String)>,
    fallback: String,
}

impl ExtensionTable {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            fallback: fallback.into(),
        }
    }

    /// Register (or replace) the extension for `resource_type`.
    pub fn with(mut self, resource_type: ResourceType, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        match self.entries.iter_mut().find(|(t, _)| *t == resource_type) {
            Some(entry) => entry.1 = ext,
            None => self.entries.push((resource_type, ext)),
        }
        self
    }

    pub fn extension(&self, resource_type: ResourceType) -> &str {
        self.entries
            .iter()
            .find(|(t, _)| *t == resource_type)
            .map(|(_, ext)| ext.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self::new("bin")
            .with(ResourceType::Shape, "shape")
            .with(ResourceType::Lightmap, "shape")
            .with(ResourceType::AudioBank, "bnk")
    }
}

/// Settings for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Prefix of raw logical-file names, e.g. `BAM_0.bin`.
    pub prefix: String,
    pub extensions: ExtensionTable,
    pub record_size: RecordSizeMode,
    /// Split reassembled files into their sub-resources.
    pub demux: bool,
    /// Report per-file failures and move on instead of stopping.
    pub keep_going: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            prefix: "BAM_".to_string(),
            extensions: ExtensionTable::default(),
            record_size: RecordSizeMode::default(),
            demux: true,
            keep_going: false,
        }
    }
}

impl ExtractOptions {
    /// `{prefix}{index}.bin`
    pub fn raw_file_name(&self, index: usize) -> String {
        format!("{}{}.bin", self.prefix, index)
    }

    /// `{prefix}{index}_uninterleaved`
    pub fn resource_dir_name(&self, index: usize) -> String {
        format!("{}{}_uninterleaved", self.prefix, index)
    }

    /// `{resource_id}_{type_tag}.{ext}`
    pub fn resource_file_name(&self, resource_id: u32, resource_type: ResourceType) -> String {
        format!(
            "{}_{}.{}",
            resource_id,
            resource_type.as_u8(),
            self.extensions.extension(resource_type)
        )
    }

    pub fn raw_file_path(&self, dir: &std::path::Path, index: usize) -> PathBuf {
        dir.join(self.raw_file_name(index))
    }

    pub fn resource_dir_path(&self, dir: &std::path::Path, index: usize) -> PathBuf {
        dir.join(self.resource_dir_name(index))
    }
}
