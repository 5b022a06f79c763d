//! 批量文件处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **配置校验**：扫描前先解析 prompt 与 schema，配置错误直接中止
//! 2. **扫描输入**：委托 InputScanner 获得有序文件列表
//! 3. **逐个处理**：严格顺序地把文件交给 FileFlow
//! 4. **输出分流**：按 prompt 的输出模式写单文件 JSON，或累积汇总行
//! 5. **汇总落盘**：批次结束时写且只写一次汇总表
//!
//! ## 设计特点
//!
//! - 单个文件的任何失败都转为失败结果，批次一定跑完
//! - 只有配置错误和输入目录扫描失败会以 Err 返回

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::AppResult;
use crate::infrastructure::InputScanner;
use crate::models::{ExtractedRecord, OutputMode};
use crate::orchestrator::aggregation::SummaryAccumulator;
use crate::services::{error_path_for, OutputSink, SummarySink, WriteOutcome};
use crate::workflow::{FileFlow, FileProcessingRequest, FileProcessingResult};

/// 一次批处理的参数
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub prompt_key: String,
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub max_file_mb: u64,
    pub overwrite: bool,
}

impl BatchRequest {
    pub fn file_request(&self, source_path: PathBuf) -> FileProcessingRequest {
        FileProcessingRequest {
            prompt_key: self.prompt_key.clone(),
            input_root: self.input_root.clone(),
            output_root: self.output_root.clone(),
            source_path,
            max_file_mb: self.max_file_mb,
            overwrite: self.overwrite,
        }
    }
}

/// 汇总表写入情况
#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub path: PathBuf,
    pub rows: usize,
    pub errors: usize,
    pub outcome: Result<WriteOutcome, String>,
}

/// 批处理结果
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// 按扫描顺序，每个文件一个
    pub results: Vec<FileProcessingResult>,
    /// 只有聚合模式才会有
    pub summary: Option<SummaryReport>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn ok_count(&self) -> usize {
        self.results.iter().filter(|r| r.ok).count()
    }

    pub fn ko_count(&self) -> usize {
        self.total() - self.ok_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileProcessingResult> {
        self.results.iter().filter(|r| !r.ok)
    }

    /// 全部文件成功且汇总表（如有）写入成功
    pub fn is_success(&self) -> bool {
        self.ko_count() == 0
            && self
                .summary
                .as_ref()
                .map_or(true, |summary| summary.outcome.is_ok())
    }
}

/// 批量处理器
pub struct BatchProcessor {
    scanner: InputScanner,
    flow: FileFlow,
    writer: Arc<dyn OutputSink>,
    summary: Arc<dyn SummarySink>,
    default_summary_filename: String,
}

impl BatchProcessor {
    pub fn new(
        flow: FileFlow,
        writer: Arc<dyn OutputSink>,
        summary: Arc<dyn SummarySink>,
        default_summary_filename: impl Into<String>,
    ) -> Self {
        Self {
            scanner: InputScanner::new(),
            flow,
            writer,
            summary,
            default_summary_filename: default_summary_filename.into(),
        }
    }

    /// 运行一个批次
    pub async fn run(&self, req: &BatchRequest) -> AppResult<BatchReport> {
        let (spec, schema) = self.flow.resolve(&req.prompt_key)?;
        log_batch_config(req, spec.output_mode, schema.name());

        let files = self.scanner.scan(&req.input_root).await?;
        if files.is_empty() {
            warn!("⚠️ 输入目录中没有可处理的文件: {}", req.input_root.display());
        } else {
            info!("✓ 找到 {} 个待处理的文件", files.len());
        }

        let total = files.len();
        let mut acc = SummaryAccumulator::new();
        let mut results = Vec::with_capacity(total);

        for (idx, source_path) in files.into_iter().enumerate() {
            let file_req = req.file_request(source_path);
            log_file_start(idx + 1, total, &file_req);

            let outcome = self.flow.run(&file_req).await?;
            let result = match outcome.record {
                Some(record) if outcome.result.ok => match outcome.output_mode {
                    OutputMode::PerFile => {
                        self.persist_record(&file_req, outcome.result, &record, &mut acc)
                            .await
                    }
                    OutputMode::AggregatedSummary => {
                        acc.observe(outcome.aggregate_filename.as_deref());
                        let added = acc.push_record(&outcome.result.filename(), &record);
                        info!("{} 📋 汇总行 +{}", file_req, added);
                        outcome.result
                    }
                },
                _ => {
                    self.record_failure(&file_req, &outcome.result, &mut acc).await;
                    outcome.result
                }
            };

            results.push(result);
        }

        let summary = if acc.is_observed() {
            Some(self.flush_summary(req, &acc).await)
        } else {
            None
        };

        let report = BatchReport { results, summary };
        log_batch_complete(&report);
        Ok(report)
    }

    /// 单文件模式：写结构化结果，写失败则把该文件转为失败
    async fn persist_record(
        &self,
        file_req: &FileProcessingRequest,
        result: FileProcessingResult,
        record: &ExtractedRecord,
        acc: &mut SummaryAccumulator,
    ) -> FileProcessingResult {
        let written = match record.to_json() {
            Ok(payload) => {
                self.writer
                    .write_record(&result.output_path, &payload, file_req.overwrite)
                    .await
            }
            Err(e) => Err(e),
        };

        match written {
            Ok(WriteOutcome::Written) => {
                info!("{} 💾 已写入: {}", file_req, result.output_path.display());
                result
            }
            Ok(WriteOutcome::SkippedExisting) => {
                info!("{} ⏭️ 已存在，保留原输出", file_req);
                result
            }
            Err(e) => {
                error!("[输出] {} ❌ 写入结果失败: {}", file_req, e);
                let failed =
                    FileProcessingResult::failure(result.source_path, result.output_path, e.to_string());
                self.record_failure(file_req, &failed, acc).await;
                failed
            }
        }
    }

    /// 失败文件：记错误行并写 `.error.json`，写失败只记日志
    async fn record_failure(
        &self,
        file_req: &FileProcessingRequest,
        result: &FileProcessingResult,
        acc: &mut SummaryAccumulator,
    ) {
        acc.push_error(result.filename(), result.error_message());

        let error_path = error_path_for(&result.output_path);
        if let Err(e) = self
            .writer
            .write_error(&error_path, result.error_message(), file_req.overwrite)
            .await
        {
            error!("[输出] {} ❌ 写入错误文件失败: {}", file_req, e);
        }
    }

    async fn flush_summary(&self, req: &BatchRequest, acc: &SummaryAccumulator) -> SummaryReport {
        let filename = acc.filename().unwrap_or(&self.default_summary_filename);
        let path = req.output_root.join(filename);

        let outcome = self
            .summary
            .write_summary(&path, acc.rows(), acc.errors(), req.overwrite)
            .await
            .map_err(|e| e.to_string());

        match &outcome {
            Ok(WriteOutcome::Written) => info!(
                "📊 汇总表已写入: {} (行: {}, 错误: {})",
                path.display(),
                acc.rows().len(),
                acc.errors().len()
            ),
            Ok(WriteOutcome::SkippedExisting) => {
                warn!("⏭️ 汇总表已存在，未覆盖: {}", path.display())
            }
            Err(e) => error!("[输出] ❌ 汇总表写入失败 {}: {}", path.display(), e),
        }

        SummaryReport {
            path,
            rows: acc.rows().len(),
            errors: acc.errors().len(),
            outcome,
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_batch_config(req: &BatchRequest, mode: OutputMode, schema: &str) {
    info!("{}", "=".repeat(60));
    info!("📁 输入目录: {}", req.input_root.display());
    info!("📂 输出目录: {}", req.output_root.display());
    info!(
        "📝 prompt: {} | schema: {} | 输出模式: {}",
        req.prompt_key,
        schema,
        mode.as_str()
    );
    info!("{}", "=".repeat(60));
}

fn log_file_start(index: usize, total: usize, file_req: &FileProcessingRequest) {
    info!("\n{}", "─".repeat(60));
    info!("({}/{}) {}", index, total, display_rel(&file_req.input_root, &file_req.source_path));
}

fn log_batch_complete(report: &BatchReport) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 批次完成: 成功 {}/{}，失败 {}",
        report.ok_count(),
        report.total(),
        report.ko_count()
    );
    info!("{}", "─".repeat(60));
}

fn display_rel(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, ok: bool) -> FileProcessingResult {
        if ok {
            FileProcessingResult::success(PathBuf::from(name), PathBuf::from("out"))
        } else {
            FileProcessingResult::failure(PathBuf::from(name), PathBuf::from("out"), "boom")
        }
    }

    #[test]
    fn test_report_tally() {
        let report = BatchReport {
            results: vec![result("a.pdf", true), result("b.jpg", false), result("c.png", true)],
            summary: None,
        };

        assert_eq!(report.total(), 3);
        assert_eq!(report.ok_count(), 2);
        assert_eq!(report.ko_count(), 1);
        assert_eq!(report.failures().count(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn test_failed_summary_is_not_success() {
        let mut report = BatchReport {
            results: vec![result("a.pdf", true)],
            summary: None,
        };
        assert!(report.is_success());

        report.summary = Some(SummaryReport {
            path: PathBuf::from("out/resumen.xlsx"),
            rows: 1,
            errors: 0,
            outcome: Err("disco lleno".to_string()),
        });
        assert!(!report.is_success());
    }

    #[test]
    fn test_empty_report_is_success() {
        assert!(BatchReport::default().is_success());
    }

    #[test]
    fn test_file_request_copies_batch_fields() {
        let req = BatchRequest {
            prompt_key: "residuos".to_string(),
            input_root: PathBuf::from("/in"),
            output_root: PathBuf::from("/out"),
            max_file_mb: 5,
            overwrite: true,
        };
        let file_req = req.file_request(PathBuf::from("/in/a.pdf"));

        assert_eq!(file_req.prompt_key, "residuos");
        assert_eq!(file_req.max_file_mb, 5);
        assert!(file_req.overwrite);
        assert_eq!(display_rel(&file_req.input_root, &file_req.source_path), "a.pdf");
    }
}
