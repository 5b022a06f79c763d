//! 抽取端口
//!
//! 单文件流程只依赖这个抽象，具体的网络实现由上层注入

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Attachment, ExtractedRecord, SchemaKind};

/// 文档理解能力：给定 prompt 与附件，返回指定 schema 的结构化结果
#[async_trait]
pub trait ExtractionPort: Send + Sync {
    async fn extract(
        &self,
        instructions: &str,
        task_text: &str,
        attachment: &Attachment,
        schema: SchemaKind,
    ) -> AppResult<ExtractedRecord>;
}
