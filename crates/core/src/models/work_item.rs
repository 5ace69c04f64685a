use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::ItemError;
use crate::traits::PayloadSource;

/// 操作参数，按键值对传递给对应的处理器
pub type OperationOptions = HashMap<String, serde_json::Value>;

/// 支持的操作类型（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Merge,
    Compress,
    Ocr,
    Convert,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Merge,
        OperationKind::Compress,
        OperationKind::Ocr,
        OperationKind::Convert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Merge => "merge",
            OperationKind::Compress => "compress",
            OperationKind::Ocr => "ocr",
            OperationKind::Convert => "convert",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = ItemError;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind.trim().to_lowercase().as_str() {
            "merge" => Ok(OperationKind::Merge),
            "compress" => Ok(OperationKind::Compress),
            "ocr" => Ok(OperationKind::Ocr),
            "convert" => Ok(OperationKind::Convert),
            _ => Err(ItemError::UnknownOperation(kind.to_string())),
        }
    }
}

/// 工作项元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    /// 文件名，尽量唯一但不保证
    pub name: String,
    /// 字节大小
    pub size: u64,
    /// MIME类型，可能缺失
    pub content_type: Option<String>,
}

impl ItemMetadata {
    pub fn new(name: impl Into<String>, size: u64, content_type: Option<String>) -> Self {
        Self {
            name: name.into(),
            size,
            content_type,
        }
    }

    /// 小写的文件扩展名（不含点）
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// 调用方提交的类文件输入：元数据加上负载访问器
#[derive(Clone)]
pub struct InputFile {
    pub metadata: ItemMetadata,
    pub source: Arc<dyn PayloadSource>,
}

impl InputFile {
    pub fn new(metadata: ItemMetadata, source: Arc<dyn PayloadSource>) -> Self {
        Self { metadata, source }
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// 工作项
///
/// 在提交时创建，结果（成功或失败）记录后即被丢弃。
/// 同一次提交的所有工作项共享操作类型和参数。
#[derive(Clone)]
pub struct WorkItem {
    pub metadata: ItemMetadata,
    pub operation: OperationKind,
    pub options: Arc<OperationOptions>,
    source: Arc<dyn PayloadSource>,
}

impl WorkItem {
    pub fn new(input: InputFile, operation: OperationKind, options: Arc<OperationOptions>) -> Self {
        Self {
            metadata: input.metadata,
            operation,
            options,
            source: input.source,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn size(&self) -> u64 {
        self.metadata.size
    }

    pub fn source(&self) -> &Arc<dyn PayloadSource> {
        &self.source
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("metadata", &self.metadata)
            .field("operation", &self.operation)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind_parsing() {
        assert_eq!("ocr".parse::<OperationKind>().unwrap(), OperationKind::Ocr);
        assert_eq!(
            " Merge ".parse::<OperationKind>().unwrap(),
            OperationKind::Merge
        );

        let err = "split".parse::<OperationKind>().unwrap_err();
        assert!(matches!(err, ItemError::UnknownOperation(ref k) if k == "split"));
    }

    #[test]
    fn test_operation_kind_serde_uses_lowercase() {
        let json = serde_json::to_string(&OperationKind::Compress).unwrap();
        assert_eq!(json, "\"compress\"");
        let kind: OperationKind = serde_json::from_str("\"convert\"").unwrap();
        assert_eq!(kind, OperationKind::Convert);
    }

    #[test]
    fn test_extension() {
        assert_eq!(
            ItemMetadata::new("Report.PDF", 1, None).extension().as_deref(),
            Some("pdf")
        );
        assert_eq!(
            ItemMetadata::new("archive.tar.gz", 1, None)
                .extension()
                .as_deref(),
            Some("gz")
        );
        assert_eq!(ItemMetadata::new("README", 1, None).extension(), None);
        assert_eq!(ItemMetadata::new(".bashrc", 1, None).extension(), None);
    }
}
