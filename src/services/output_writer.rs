//! 输出写入服务 - 业务能力层
//!
//! 只负责"把单个文件的结果写成 JSON"能力，不关心流程

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// 写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// 目标已存在且不允许覆盖，未做任何改动
    SkippedExisting,
}

/// 单文件输出能力
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// 写入结构化结果
    async fn write_record(
        &self,
        path: &Path,
        payload: &JsonValue,
        overwrite: bool,
    ) -> AppResult<WriteOutcome>;

    /// 写入 `{ok: false, error}` 错误文件
    async fn write_error(&self, path: &Path, message: &str, overwrite: bool)
        -> AppResult<WriteOutcome>;
}

/// `<output>.error.json`
pub fn error_path_for(output_path: &Path) -> PathBuf {
    let mut raw = output_path.as_os_str().to_os_string();
    raw.push(".error.json");
    PathBuf::from(raw)
}

/// JSON 输出写入器
///
/// 职责：
/// - 自动创建父目录
/// - 按 overwrite 决定是否覆盖已有文件
/// - 只处理单个文件，不出现 Vec<结果>
#[derive(Debug, Clone, Default)]
pub struct JsonOutputWriter;

impl JsonOutputWriter {
    pub fn new() -> Self {
        Self
    }

    async fn write_json(
        &self,
        path: &Path,
        payload: &JsonValue,
        overwrite: bool,
    ) -> AppResult<WriteOutcome> {
        if !overwrite && fs::try_exists(path).await.unwrap_or(false) {
            warn!("输出已存在且未开启覆盖，跳过: {}", path.display());
            return Ok(WriteOutcome::SkippedExisting);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
        }

        let text = serde_json::to_string_pretty(payload)
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        fs::write(path, text)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        debug!("写入: {}", path.display());
        Ok(WriteOutcome::Written)
    }
}

#[async_trait]
impl OutputSink for JsonOutputWriter {
    async fn write_record(
        &self,
        path: &Path,
        payload: &JsonValue,
        overwrite: bool,
    ) -> AppResult<WriteOutcome> {
        self.write_json(path, payload, overwrite).await
    }

    async fn write_error(
        &self,
        path: &Path,
        message: &str,
        overwrite: bool,
    ) -> AppResult<WriteOutcome> {
        let payload = json!({ "ok": false, "error": message });
        self.write_json(path, &payload, overwrite).await
    }
}
