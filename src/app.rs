//! 命令行前端用到的本地文件适配器

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use batch_core::{
    ErrorRecord, InputFile, ItemError, ItemMetadata, OperationKind, OperationOptions, Payload,
    PayloadSource, RunSummary, SubmissionGate, TransformEngine, WorkItem,
};
use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// 从本地文件读取负载
#[derive(Debug, Clone)]
pub struct FilePayloadSource {
    path: PathBuf,
}

impl FilePayloadSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PayloadSource for FilePayloadSource {
    async fn read(&self) -> io::Result<Bytes> {
        tokio::fs::read(&self.path).await.map(Bytes::from)
    }
}

/// 根据扩展名推断MIME类型
pub fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "doc" => "application/msword",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        _ => return None,
    };
    Some(content_type)
}

/// 把命令行给出的路径展开为输入文件，目录递归展开，结果按路径排序
pub async fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>> {
    let mut files = Vec::new();
    let mut pending: Vec<PathBuf> = paths.to_vec();

    while let Some(path) = pending.pop() {
        let metadata = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("无法访问路径: {}", path.display()))?;

        if metadata.is_dir() {
            let mut entries = tokio::fs::read_dir(&path)
                .await
                .with_context(|| format!("读取目录失败: {}", path.display()))?;
            while let Some(entry) = entries.next_entry().await? {
                pending.push(entry.path());
            }
        } else if metadata.is_file() {
            files.push((path, metadata.len()));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    debug!("共找到 {} 个输入文件", files.len());

    Ok(files
        .into_iter()
        .map(|(path, size)| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let content_type = guess_content_type(&path).map(str::to_string);
            InputFile::new(
                ItemMetadata::new(name, size, content_type),
                std::sync::Arc::new(FilePayloadSource::new(path)),
            )
        })
        .collect())
}

/// 解析 `key=value` 形式的操作参数，值能按JSON解析时保留类型
pub fn parse_options<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<OperationOptions> {
    let mut options = OperationOptions::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("参数格式应为 key=value: {pair}"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow::anyhow!("参数名不能为空: {pair}"));
        }
        let value = serde_json::from_str(value.trim())
            .unwrap_or_else(|_| serde_json::Value::String(value.trim().to_string()));
        options.insert(key.to_string(), value);
    }
    Ok(options)
}

/// 不做实际转换，只报告负载大小
#[derive(Debug, Default)]
pub struct DryRunEngine;

#[async_trait]
impl TransformEngine for DryRunEngine {
    async fn transform(
        &self,
        kind: OperationKind,
        item: &WorkItem,
        payload: Payload,
        options: &OperationOptions,
    ) -> Result<Payload, ItemError> {
        info!(
            operation = %kind,
            item = item.name(),
            bytes = payload.len(),
            options = options.len(),
            "dry-run: 跳过实际转换"
        );
        Ok(payload)
    }
}

/// 在终端询问用户是否继续
pub struct StdinGate;

#[async_trait]
impl SubmissionGate for StdinGate {
    async fn confirm(&self, item_count: usize, kind: OperationKind) -> bool {
        let mut stdout = tokio::io::stdout();
        let prompt = format!("即将对 {item_count} 个文件执行 {kind}，是否继续? [y/N] ");
        if stdout.write_all(prompt.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return false;
        }

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut line).await {
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

/// `--yes` 时使用，直接放行
pub struct AutoApprove;

#[async_trait]
impl SubmissionGate for AutoApprove {
    async fn confirm(&self, _item_count: usize, _kind: OperationKind) -> bool {
        true
    }
}

pub fn print_summary(summary: &RunSummary, errors: &[ErrorRecord]) {
    println!("处理完成 (run {})", summary.run_id);
    println!("  已处理: {}", summary.processed);
    println!("  失败:   {}", summary.errors);
    println!("  成功率: {:.1}%", summary.success_rate * 100.0);
    println!("  耗时:   {:.2}s", summary.duration.as_secs_f64());

    if !errors.is_empty() {
        println!("失败明细:");
        for record in errors {
            println!("  [{}] {}: {}", record.kind, record.item_name, record.message);
        }
    }
}
