//! 转换引擎接口
//!
//! 合并、压缩、OCR、格式转换的实际内容处理由外部文档或OCR引擎完成，
//! 此处只定义契约：校验通过的工作项进，成功负载或类型化错误出。

use async_trait::async_trait;

use crate::errors::ItemError;
use crate::models::{OperationKind, OperationOptions, WorkItem};

use super::payload::Payload;

/// 外部转换引擎
///
/// # 实现要求
///
/// - 只会收到已经通过校验的工作项
/// - 失败时返回 `ItemError::Transform`，不要panic
/// - 同一批次内最多有 `K` 个调用同时进行，实现者不需要自行限流
///
/// # 示例
///
/// ```rust
/// use async_trait::async_trait;
/// use batch_core::traits::{Payload, TransformEngine};
/// use batch_core::{ItemError, OperationKind, OperationOptions, WorkItem};
///
/// struct Passthrough;
///
/// #[async_trait]
/// impl TransformEngine for Passthrough {
///     async fn transform(
///         &self,
///         _kind: OperationKind,
///         _item: &WorkItem,
///         payload: Payload,
///         _options: &OperationOptions,
///     ) -> Result<Payload, ItemError> {
///         Ok(payload)
///     }
/// }
/// ```
#[async_trait]
pub trait TransformEngine: Send + Sync {
    async fn transform(
        &self,
        kind: OperationKind,
        item: &WorkItem,
        payload: Payload,
        options: &OperationOptions,
    ) -> Result<Payload, ItemError>;
}
