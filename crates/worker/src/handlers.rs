//! 各操作类型的处理器
//!
//! 每个处理器先用白名单和大小上限校验工作项，再校验自己的参数，
//! 校验失败时不会调用转换引擎。实际转换交给注入的 [`TransformEngine`]。

use std::sync::Arc;

use async_trait::async_trait;
use batch_core::config::OperationRule;
use batch_core::{ItemError, OperationKind, OperationOptions, Payload, TransformEngine, WorkItem};

/// 操作处理器接口
#[async_trait]
pub trait OperationHandler: Send + Sync {
    fn kind(&self) -> OperationKind;

    fn name(&self) -> &str;

    fn input_validator(&self) -> &InputValidator;

    /// 校验操作参数，默认不做限制
    fn validate_options(&self, _item: &WorkItem, _options: &OperationOptions) -> Result<(), ItemError> {
        Ok(())
    }

    /// 完整校验：输入类型、大小、参数
    fn validate(&self, item: &WorkItem) -> Result<(), ItemError> {
        self.input_validator().check(item)?;
        self.validate_options(item, &item.options)
    }

    /// 执行转换，调用方保证已经通过 `validate`
    async fn execute(&self, item: &WorkItem, payload: Payload) -> Result<Payload, ItemError>;
}

/// 输入校验：扩展名或MIME类型白名单，加上大小上限
#[derive(Debug, Clone)]
pub struct InputValidator {
    rule: OperationRule,
    max_size_bytes: u64,
}

impl InputValidator {
    /// `max_size_bytes` 是全局上限，规则里的覆盖值优先
    pub fn new(rule: OperationRule, max_size_bytes: u64) -> Self {
        let max_size_bytes = rule.max_size_bytes.unwrap_or(max_size_bytes);
        Self {
            rule,
            max_size_bytes,
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn check(&self, item: &WorkItem) -> Result<(), ItemError> {
        let name = item.name();
        if name.trim().is_empty() {
            return Err(ItemError::validation(name, "文件名为空"));
        }

        if item.size() > self.max_size_bytes {
            return Err(ItemError::validation(
                name,
                format!(
                    "文件大小 {} 字节超过上限 {} 字节",
                    item.size(),
                    self.max_size_bytes
                ),
            ));
        }

        let extension_allowed = item
            .metadata
            .extension()
            .is_some_and(|ext| self.rule.allows_extension(&ext));
        let content_type_allowed = item
            .metadata
            .content_type
            .as_deref()
            .is_some_and(|ct| self.rule.allows_content_type(ct));

        if !extension_allowed && !content_type_allowed {
            return Err(ItemError::validation(
                name,
                format!(
                    "{} 不支持该文件类型 (content_type={})",
                    item.operation,
                    item.metadata.content_type.as_deref().unwrap_or("unknown")
                ),
            ));
        }

        Ok(())
    }
}

fn option_str<'a>(
    item: &WorkItem,
    options: &'a OperationOptions,
    key: &str,
) -> Result<Option<&'a str>, ItemError> {
    match options.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| ItemError::validation(item.name(), format!("参数 {key} 必须是字符串"))),
    }
}

/// 合并PDF
pub struct MergeHandler {
    validator: InputValidator,
    engine: Arc<dyn TransformEngine>,
}

impl MergeHandler {
    pub fn new(validator: InputValidator, engine: Arc<dyn TransformEngine>) -> Self {
        Self { validator, engine }
    }
}

#[async_trait]
impl OperationHandler for MergeHandler {
    fn kind(&self) -> OperationKind {
        OperationKind::Merge
    }

    fn name(&self) -> &str {
        "merge-handler"
    }

    fn input_validator(&self) -> &InputValidator {
        &self.validator
    }

    async fn execute(&self, item: &WorkItem, payload: Payload) -> Result<Payload, ItemError> {
        self.engine
            .transform(OperationKind::Merge, item, payload, &item.options)
            .await
    }
}

/// 压缩PDF
pub struct CompressHandler {
    validator: InputValidator,
    engine: Arc<dyn TransformEngine>,
}

impl CompressHandler {
    pub const QUALITY_LEVELS: [&'static str; 3] = ["low", "medium", "high"];

    pub fn new(validator: InputValidator, engine: Arc<dyn TransformEngine>) -> Self {
        Self { validator, engine }
    }
}

#[async_trait]
impl OperationHandler for CompressHandler {
    fn kind(&self) -> OperationKind {
        OperationKind::Compress
    }

    fn name(&self) -> &str {
        "compress-handler"
    }

    fn input_validator(&self) -> &InputValidator {
        &self.validator
    }

    fn validate_options(&self, item: &WorkItem, options: &OperationOptions) -> Result<(), ItemError> {
        if let Some(quality) = option_str(item, options, "quality")? {
            if !Self::QUALITY_LEVELS.contains(&quality) {
                return Err(ItemError::validation(
                    item.name(),
                    format!(
                        "无效的压缩质量: {quality}，支持: {:?}",
                        Self::QUALITY_LEVELS
                    ),
                ));
            }
        }
        Ok(())
    }

    async fn execute(&self, item: &WorkItem, payload: Payload) -> Result<Payload, ItemError> {
        self.engine
            .transform(OperationKind::Compress, item, payload, &item.options)
            .await
    }
}

/// 文字识别
pub struct OcrHandler {
    validator: InputValidator,
    engine: Arc<dyn TransformEngine>,
}

impl OcrHandler {
    pub fn new(validator: InputValidator, engine: Arc<dyn TransformEngine>) -> Self {
        Self { validator, engine }
    }
}

#[async_trait]
impl OperationHandler for OcrHandler {
    fn kind(&self) -> OperationKind {
        OperationKind::Ocr
    }

    fn name(&self) -> &str {
        "ocr-handler"
    }

    fn input_validator(&self) -> &InputValidator {
        &self.validator
    }

    fn validate_options(&self, item: &WorkItem, options: &OperationOptions) -> Result<(), ItemError> {
        if let Some(language) = option_str(item, options, "language")? {
            if language.trim().is_empty() {
                return Err(ItemError::validation(item.name(), "OCR语言不能为空"));
            }
        }
        Ok(())
    }

    async fn execute(&self, item: &WorkItem, payload: Payload) -> Result<Payload, ItemError> {
        self.engine
            .transform(OperationKind::Ocr, item, payload, &item.options)
            .await
    }
}

/// 格式转换
pub struct ConvertHandler {
    validator: InputValidator,
    engine: Arc<dyn TransformEngine>,
}

impl ConvertHandler {
    pub const TARGET_FORMATS: [&'static str; 6] = ["pdf", "png", "jpg", "docx", "txt", "html"];

    pub fn new(validator: InputValidator, engine: Arc<dyn TransformEngine>) -> Self {
        Self { validator, engine }
    }
}

#[async_trait]
impl OperationHandler for ConvertHandler {
    fn kind(&self) -> OperationKind {
        OperationKind::Convert
    }

    fn name(&self) -> &str {
        "convert-handler"
    }

    fn input_validator(&self) -> &InputValidator {
        &self.validator
    }

    fn validate_options(&self, item: &WorkItem, options: &OperationOptions) -> Result<(), ItemError> {
        if let Some(target) = option_str(item, options, "target_format")? {
            let target = target.to_ascii_lowercase();
            if !Self::TARGET_FORMATS.contains(&target.as_str()) {
                return Err(ItemError::validation(
                    item.name(),
                    format!("不支持的目标格式: {target}"),
                ));
            }
        }
        Ok(())
    }

    async fn execute(&self, item: &WorkItem, payload: Payload) -> Result<Payload, ItemError> {
        self.engine
            .transform(OperationKind::Convert, item, payload, &item.options)
            .await
    }
}
