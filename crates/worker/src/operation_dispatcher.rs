use std::collections::HashMap;
use std::sync::Arc;

use batch_core::config::{AppConfig, OperationRulesConfig};
use batch_core::{ItemError, ItemOutcome, OperationKind, TransformEngine, WorkItem};
use tracing::{debug, info};

use crate::handlers::{
    CompressHandler, ConvertHandler, InputValidator, MergeHandler, OcrHandler, OperationHandler,
};
use crate::payload_reader::{read_with_retry, ReadRetryPolicy};

/// 操作分发器
///
/// 按操作类型查表找到处理器，依次执行：校验、带重试的负载读取、转换。
/// 处理器表在构建后不再变化。
pub struct OperationDispatcher {
    handlers: HashMap<OperationKind, Arc<dyn OperationHandler>>,
    retry_policy: ReadRetryPolicy,
}

impl OperationDispatcher {
    pub fn new(retry_policy: ReadRetryPolicy) -> Self {
        Self {
            handlers: HashMap::new(),
            retry_policy,
        }
    }

    /// 注册全部四种内置处理器，共用同一个转换引擎
    pub fn with_default_handlers(
        engine: Arc<dyn TransformEngine>,
        rules: &OperationRulesConfig,
        max_item_size_bytes: u64,
        retry_policy: ReadRetryPolicy,
    ) -> Self {
        let validator =
            |kind: OperationKind| InputValidator::new(rules.rule(kind).clone(), max_item_size_bytes);

        Self::new(retry_policy)
            .with_handler(Arc::new(MergeHandler::new(
                validator(OperationKind::Merge),
                Arc::clone(&engine),
            )))
            .with_handler(Arc::new(CompressHandler::new(
                validator(OperationKind::Compress),
                Arc::clone(&engine),
            )))
            .with_handler(Arc::new(OcrHandler::new(
                validator(OperationKind::Ocr),
                Arc::clone(&engine),
            )))
            .with_handler(Arc::new(ConvertHandler::new(
                validator(OperationKind::Convert),
                engine,
            )))
    }

    pub fn from_config(engine: Arc<dyn TransformEngine>, config: &AppConfig) -> Self {
        Self::with_default_handlers(
            engine,
            &config.operations,
            config.scheduler.max_item_size_bytes,
            ReadRetryPolicy::from_config(&config.scheduler),
        )
    }

    /// 注册处理器，同类型的旧处理器会被替换
    pub fn with_handler(mut self, handler: Arc<dyn OperationHandler>) -> Self {
        info!("注册操作处理器: {} ({})", handler.name(), handler.kind());
        self.handlers.insert(handler.kind(), handler);
        self
    }

    pub fn contains(&self, kind: OperationKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn supported_kinds(&self) -> Vec<OperationKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }

    fn handler(&self, kind: OperationKind) -> Result<&Arc<dyn OperationHandler>, ItemError> {
        self.handlers
            .get(&kind)
            .ok_or_else(|| ItemError::UnknownOperation(kind.to_string()))
    }

    /// 处理单个工作项
    pub async fn dispatch(&self, item: &WorkItem) -> ItemOutcome {
        let handler = self.handler(item.operation)?;
        handler.validate(item)?;

        let payload = read_with_retry(item, &self.retry_policy).await?;
        debug!(
            item = item.name(),
            bytes = payload.len(),
            handler = handler.name(),
            "负载已读取，开始转换"
        );

        handler.execute(item, payload).await
    }

    /// 按名称分发，名称无法识别时返回 `UnknownOperation`
    pub async fn dispatch_named(&self, kind: &str, item: &WorkItem) -> ItemOutcome {
        let kind: OperationKind = kind.parse()?;
        if kind != item.operation {
            let mut retagged = item.clone();
            retagged.operation = kind;
            return self.dispatch(&retagged).await;
        }
        self.dispatch(item).await
    }
}
