use thiserror::Error;

/// 单个工作项处理失败的类型
///
/// 这些错误在lane边界被捕获并记录，永远不会中断批次或队列。
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("校验失败 [{item}]: {reason}")]
    Validation { item: String, reason: String },

    #[error("读取失败 [{item}]，已重试{attempts}次: {source}")]
    Read {
        item: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("转换失败 [{item}]: {message}")]
    Transform { item: String, message: String },

    #[error("未知的操作类型: {0}")]
    UnknownOperation(String),
}

impl ItemError {
    pub fn validation(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            item: item.into(),
            reason: reason.into(),
        }
    }

    pub fn transform(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            item: item.into(),
            message: message.into(),
        }
    }

    /// 错误类别，用于日志和指标标签
    pub fn kind(&self) -> &'static str {
        match self {
            ItemError::Validation { .. } => "validation",
            ItemError::Read { .. } => "read",
            ItemError::Transform { .. } => "transform",
            ItemError::UnknownOperation(_) => "unknown_operation",
        }
    }
}

/// 调度器错误类型定义
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("队列已满: 已有{pending}项待处理，本次提交{requested}项，上限{limit}项")]
    QueueFull {
        pending: usize,
        requested: usize,
        limit: usize,
    },

    #[error(transparent)]
    Item(#[from] ItemError),
}

/// 统一的Result类型
pub type Result<T> = std::result::Result<T, SchedulerError>;
