use async_trait::async_trait;
use bytes::Bytes;

/// 处理结果负载
pub type Payload = Bytes;

/// 工作项的二进制负载访问器
///
/// 读取可能暂时失败（网络盘、云端文件句柄等），调用方按
/// 读取重试约定处理 `Err`。
#[async_trait]
pub trait PayloadSource: Send + Sync {
    async fn read(&self) -> std::io::Result<Bytes>;
}
