//! 单文件处理上下文
//!
//! 封装"我正在处理哪个文件、结果写到哪里"这一信息

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::models::{ExtractedRecord, OutputMode};

/// 单文件处理请求（每个扫描到的文件一个）
#[derive(Debug, Clone)]
pub struct FileProcessingRequest {
    pub prompt_key: String,
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub source_path: PathBuf,
    /// 大小上限 (MB)
    pub max_file_mb: u64,
    pub overwrite: bool,
}

impl FileProcessingRequest {
    pub fn filename(&self) -> String {
        file_name_of(&self.source_path)
    }
}

impl Display for FileProcessingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文件 {} | prompt {}]", self.filename(), self.prompt_key)
    }
}

/// 单文件处理结果，每个请求恰好产生一个
///
/// `ok == false` 时 `error` 一定有值
#[derive(Debug, Clone, PartialEq)]
pub struct FileProcessingResult {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub ok: bool,
    pub error: Option<String>,
}

impl FileProcessingResult {
    pub fn success(source_path: PathBuf, output_path: PathBuf) -> Self {
        Self {
            source_path,
            output_path,
            ok: true,
            error: None,
        }
    }

    pub fn failure(source_path: PathBuf, output_path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            source_path,
            output_path,
            ok: false,
            error: Some(error.into()),
        }
    }

    pub fn filename(&self) -> String {
        file_name_of(&self.source_path)
    }

    /// 失败时的错误信息
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("未知错误")
    }
}

/// 单文件流程的完整产出
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub result: FileProcessingResult,
    /// 只在成功时存在
    pub record: Option<ExtractedRecord>,
    pub output_mode: OutputMode,
    pub aggregate_filename: Option<String>,
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
