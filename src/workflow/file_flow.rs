//! 单文件处理流程 - 流程层
//!
//! 核心职责：定义"一个文件"的完整处理流程
//!
//! 流程顺序：
//! 1. 解析 prompt 与 schema（失败为配置错误，直接返回 Err）
//! 2. 计算输出路径
//! 3. 读取文件并检查大小（超限 → 失败结果，不调用抽取）
//! 4. 判断附件类型
//! 5. 调用抽取端口（任何失败 → 失败结果）

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult, FileError};
use crate::models::{Attachment, ExtractedRecord, PromptSpec, SchemaKind};
use crate::services::{ExtractionPort, PromptRegistry};
use crate::workflow::file_ctx::{FileOutcome, FileProcessingRequest, FileProcessingResult};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// 单文件处理流程
///
/// - 只处理一个文件
/// - 不写任何输出（落盘由编排层决定）
/// - 单个文件的失败一律转为失败结果，不向上抛出
pub struct FileFlow {
    prompts: Arc<dyn PromptRegistry>,
    extractor: Arc<dyn ExtractionPort>,
}

impl FileFlow {
    pub fn new(prompts: Arc<dyn PromptRegistry>, extractor: Arc<dyn ExtractionPort>) -> Self {
        Self { prompts, extractor }
    }

    /// 解析 prompt 及其 schema
    pub fn resolve(&self, prompt_key: &str) -> AppResult<(PromptSpec, SchemaKind)> {
        let spec = self.prompts.get(prompt_key)?;
        let schema = SchemaKind::from_name(&spec.schema_name)?;
        Ok((spec, schema))
    }

    pub async fn run(&self, req: &FileProcessingRequest) -> AppResult<FileOutcome> {
        let (spec, schema) = self.resolve(&req.prompt_key)?;
        let output_path = build_output_path(&req.input_root, &req.output_root, &req.source_path);

        let data = match fs::read(&req.source_path).await {
            Ok(data) => data,
            Err(e) => {
                let err = AppError::file_read_failed(req.source_path.display().to_string(), e);
                warn!("{} ⚠️ {}", req, err);
                return Ok(failed(&spec, req, output_path, err));
            }
        };

        let size_mb = data.len() as f64 / BYTES_PER_MB;
        if size_mb > req.max_file_mb as f64 {
            let err = AppError::from(FileError::TooLarge {
                size_mb,
                limit_mb: req.max_file_mb,
            });
            warn!("{} ⚠️ {}", req, err);
            return Ok(failed(&spec, req, output_path, err));
        }

        let attachment = Attachment::classify(&req.source_path, data);
        debug!(
            "{} 附件: kind={} mime={} size={:.2} MB",
            req,
            attachment.kind.as_str(),
            attachment.mime_type,
            size_mb
        );

        let extracted = self
            .extractor
            .extract(&spec.system_instructions, &spec.user_text(), &attachment, schema)
            .await;

        match extracted {
            Ok(record) => {
                info!("{} ✓ 抽取成功 (schema: {})", req, record.schema());
                Ok(succeeded(&spec, req, output_path, record))
            }
            Err(err) => {
                error!("{} ❌ 抽取失败: {}", req, err);
                Ok(failed(&spec, req, output_path, err))
            }
        }
    }
}

fn succeeded(
    spec: &PromptSpec,
    req: &FileProcessingRequest,
    output_path: PathBuf,
    record: ExtractedRecord,
) -> FileOutcome {
    FileOutcome {
        result: FileProcessingResult::success(req.source_path.clone(), output_path),
        record: Some(record),
        output_mode: spec.output_mode,
        aggregate_filename: spec.aggregate_filename.clone(),
    }
}

fn failed(
    spec: &PromptSpec,
    req: &FileProcessingRequest,
    output_path: PathBuf,
    err: AppError,
) -> FileOutcome {
    FileOutcome {
        result: FileProcessingResult::failure(req.source_path.clone(), output_path, err.to_string()),
        record: None,
        output_mode: spec.output_mode,
        aggregate_filename: spec.aggregate_filename.clone(),
    }
}

/// 输出路径：保持相对 input_root 的目录结构，在原文件名后追加 `.json`
///
/// `input/a/b/doc.pdf` → `output/a/b/doc.pdf.json`
pub fn build_output_path(input_root: &Path, output_root: &Path, source_path: &Path) -> PathBuf {
    let rel = source_path
        .strip_prefix(input_root)
        .ok()
        .filter(|rel| rel.file_name().is_some())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(source_path.file_name().unwrap_or_default()));

    let mut name = rel.file_name().unwrap_or_default().to_os_string();
    name.push(".json");

    output_root.join(&rel).with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WasteManifest;
    use crate::services::TomlPromptRegistry;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    const PROMPTS: &str = r#"
[residuos]
system = "sys"
task = "task"
schema = "residuos_documento"
output_mode = "excel_summary"

[roto]
schema = "no_existe"
"#;

    /// 计数的假抽取端口
    struct CountingExtractor {
        calls: AtomicUsize,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl ExtractionPort for CountingExtractor {
        async fn extract(
            &self,
            _instructions: &str,
            _task_text: &str,
            _attachment: &Attachment,
            _schema: SchemaKind,
        ) -> AppResult<ExtractedRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(msg) => Err(AppError::Other(msg.clone())),
                None => Ok(ExtractedRecord::WasteManifest(WasteManifest::default())),
            }
        }
    }

    fn flow(fail_with: Option<&str>) -> (FileFlow, Arc<CountingExtractor>) {
        let extractor = Arc::new(CountingExtractor {
            calls: AtomicUsize::new(0),
            fail_with: fail_with.map(str::to_string),
        });
        let prompts = Arc::new(TomlPromptRegistry::from_toml_str(PROMPTS).unwrap());
        (FileFlow::new(prompts, extractor.clone()), extractor)
    }

    fn request(root: &Path, rel: &str, key: &str, max_file_mb: u64) -> FileProcessingRequest {
        FileProcessingRequest {
            prompt_key: key.to_string(),
            input_root: root.join("in"),
            output_root: root.join("out"),
            source_path: root.join("in").join(rel),
            max_file_mb,
            overwrite: false,
        }
    }

    fn write_input(root: &Path, rel: &str, len: usize) {
        let path = root.join("in").join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, vec![0u8; len]).unwrap();
    }

    #[test]
    fn test_build_output_path_mirrors_tree() {
        let out = build_output_path(
            Path::new("/data/in"),
            Path::new("/data/out"),
            Path::new("/data/in/a/b/doc.pdf"),
        );
        assert_eq!(out, PathBuf::from("/data/out/a/b/doc.pdf.json"));

        let flat = build_output_path(
            Path::new("/data/in"),
            Path::new("/data/out"),
            Path::new("/data/in/doc.JPG"),
        );
        assert_eq!(flat, PathBuf::from("/data/out/doc.JPG.json"));
    }

    #[test]
    fn test_build_output_path_outside_root_uses_file_name() {
        let out = build_output_path(
            Path::new("/data/in"),
            Path::new("/data/out"),
            Path::new("/elsewhere/x.png"),
        );
        assert_eq!(out, PathBuf::from("/data/out/x.png.json"));
    }

    #[tokio::test]
    async fn test_success_carries_record_and_mode() {
        let dir = tempdir().unwrap();
        write_input(dir.path(), "a/doc.pdf", 16);
        let (flow, extractor) = flow(None);

        let outcome = flow
            .run(&request(dir.path(), "a/doc.pdf", "residuos", 20))
            .await
            .unwrap();

        assert!(outcome.result.ok);
        assert!(outcome.result.error.is_none());
        assert!(outcome.record.is_some());
        assert_eq!(outcome.output_mode, crate::models::OutputMode::AggregatedSummary);
        assert_eq!(
            outcome.result.output_path,
            dir.path().join("out").join("a").join("doc.pdf.json")
        );
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_oversized_file_skips_extraction() {
        let dir = tempdir().unwrap();
        write_input(dir.path(), "big.png", 2 * 1024 * 1024 + 10);
        let (flow, extractor) = flow(None);

        let outcome = flow
            .run(&request(dir.path(), "big.png", "residuos", 1))
            .await
            .unwrap();

        assert!(!outcome.result.ok);
        assert!(outcome.record.is_none());
        let msg = outcome.result.error.unwrap();
        assert!(msg.contains("2.00"));
        assert!(msg.contains("MAX_FILE_MB=1"));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_is_stringified() {
        let dir = tempdir().unwrap();
        write_input(dir.path(), "doc.jpg", 8);
        let (flow, _) = flow(Some("timeout del servicio"));

        let outcome = flow
            .run(&request(dir.path(), "doc.jpg", "residuos", 20))
            .await
            .unwrap();

        assert!(!outcome.result.ok);
        assert!(outcome.result.error_message().contains("timeout del servicio"));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_per_file_failure() {
        let dir = tempdir().unwrap();
        let (flow, extractor) = flow(None);

        let outcome = flow
            .run(&request(dir.path(), "missing.pdf", "residuos", 20))
            .await
            .unwrap();

        assert!(!outcome.result.ok);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_prompt_and_schema_are_config_errors() {
        let dir = tempdir().unwrap();
        write_input(dir.path(), "doc.pdf", 8);
        let (flow, extractor) = flow(None);

        let err = flow
            .run(&request(dir.path(), "doc.pdf", "desconocido", 20))
            .await
            .unwrap_err();
        assert!(err.is_config());

        let err = flow
            .run(&request(dir.path(), "doc.pdf", "roto", 20))
            .await
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("no_existe"));

        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }
}
