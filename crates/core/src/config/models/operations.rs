use serde::{Deserialize, Serialize};

use crate::models::OperationKind;

/// 单个操作类型的输入白名单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationRule {
    /// 允许的扩展名（小写，不含点）
    pub extensions: Vec<String>,
    /// 允许的MIME类型
    pub content_types: Vec<String>,
    /// 覆盖全局的大小上限
    pub max_size_bytes: Option<u64>,
}

impl OperationRule {
    fn new(extensions: &[&str], content_types: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            content_types: content_types.iter().map(|s| s.to_string()).collect(),
            max_size_bytes: None,
        }
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }

    pub fn allows_content_type(&self, content_type: &str) -> bool {
        // 忽略 "; charset=..." 之类的参数
        let essence = content_type.split(';').next().unwrap_or("").trim();
        self.content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "tif", "bmp", "webp"];
const IMAGE_CONTENT_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/tiff",
    "image/bmp",
    "image/webp",
];

/// 各操作类型的输入规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationRulesConfig {
    pub merge: OperationRule,
    pub compress: OperationRule,
    pub ocr: OperationRule,
    pub convert: OperationRule,
}

impl Default for OperationRulesConfig {
    fn default() -> Self {
        let pdf_only = OperationRule::new(&["pdf"], &["application/pdf"]);

        let mut ocr_extensions = vec!["pdf"];
        ocr_extensions.extend_from_slice(IMAGE_EXTENSIONS);
        let mut ocr_types = vec!["application/pdf"];
        ocr_types.extend_from_slice(IMAGE_CONTENT_TYPES);

        let mut convert_extensions = ocr_extensions.clone();
        convert_extensions.extend_from_slice(&["docx", "doc", "pptx", "xlsx", "txt", "html"]);
        let mut convert_types = ocr_types.clone();
        convert_types.extend_from_slice(&[
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "text/plain",
            "text/html",
        ]);

        Self {
            merge: pdf_only.clone(),
            compress: pdf_only,
            ocr: OperationRule::new(&ocr_extensions, &ocr_types),
            convert: OperationRule::new(&convert_extensions, &convert_types),
        }
    }
}

impl OperationRulesConfig {
    pub fn rule(&self, kind: OperationKind) -> &OperationRule {
        match kind {
            OperationKind::Merge => &self.merge,
            OperationKind::Compress => &self.compress,
            OperationKind::Ocr => &self.ocr,
            OperationKind::Convert => &self.convert,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for kind in OperationKind::ALL {
            let rule = self.rule(kind);
            if rule.extensions.is_empty() && rule.content_types.is_empty() {
                return Err(anyhow::anyhow!("操作 {kind} 的输入白名单不能为空"));
            }
            if rule.max_size_bytes == Some(0) {
                return Err(anyhow::anyhow!("操作 {kind} 的大小上限必须大于0"));
            }
        }
        Ok(())
    }
}
