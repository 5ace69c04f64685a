//! Test data builders for creating work items

use batch_core::{
    InputFile, ItemMetadata, OperationKind, OperationOptions, PayloadSource, WorkItem,
};
use std::sync::Arc;

use crate::mocks::StaticPayloadSource;

/// Builder for [`InputFile`] with a small PDF payload by default
pub struct InputFileBuilder {
    metadata: ItemMetadata,
    source: Arc<dyn PayloadSource>,
}

impl InputFileBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            metadata: ItemMetadata::new(name, 1024, None),
            source: Arc::new(StaticPayloadSource::new(&b"%PDF-1.7 test"[..])),
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.metadata.size = size;
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.metadata.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_source(mut self, source: Arc<dyn PayloadSource>) -> Self {
        self.source = source;
        self
    }

    pub fn build(self) -> InputFile {
        InputFile::new(self.metadata, self.source)
    }

    /// Build a work item tagged with `operation` and no options
    pub fn build_item(self, operation: OperationKind) -> WorkItem {
        WorkItem::new(self.build(), operation, Arc::new(OperationOptions::new()))
    }
}

/// `count` PDF inputs named `{prefix}-{i}.pdf`
pub fn pdf_inputs(prefix: &str, count: usize) -> Vec<InputFile> {
    (0..count)
        .map(|i| InputFileBuilder::new(&format!("{prefix}-{i}.pdf")).build())
        .collect()
}
