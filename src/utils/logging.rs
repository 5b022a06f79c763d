//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::orchestrator::BatchReport;

/// 日志文件名
pub const LOG_FILE_NAME: &str = "doc_batch.log";

/// 初始化日志：控制台 + 日志文件
///
/// # 参数
/// - `level`: 默认日志级别（`RUST_LOG` 优先）
/// - `log_dir`: 日志目录
///
/// # 返回
/// 返回日志文件路径
pub fn init(level: &str, log_dir: &str) -> Result<PathBuf> {
    let log_file_path = Path::new(log_dir).join(LOG_FILE_NAME);
    init_log_file(&log_file_path)?;

    let file = OpenOptions::new()
        .append(true)
        .open(&log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("日志系统初始化失败")?;

    Ok(log_file_path)
}

/// 初始化日志文件（覆盖旧内容，写入带时间的表头）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("无法创建日志目录: {}", parent.display()))?;
    }

    let log_header = format!(
        "{}\n文档批处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path.display()))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 文档批量抽取");
    info!("🤖 模型: {}", config.openai_model);
    info!("📚 prompt 目录: {}", config.prompts_path);
    info!(
        "📏 文件上限: {} MB | 覆盖已有输出: {}",
        config.max_file_mb, config.overwrite_output
    );
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `report`: 批处理结果
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(report: &BatchReport, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 已处理: {}", report.total());
    info!("✅ 成功: {}/{}", report.ok_count(), report.total());
    info!("❌ 失败: {}", report.ko_count());
    for failure in report.failures() {
        error!("   - {}: {}", failure.filename(), truncate_text(failure.error_message(), 200));
    }
    if let Some(summary) = &report.summary {
        match &summary.outcome {
            Ok(_) => info!("📊 汇总表: {}", summary.path.display()),
            Err(e) => error!("📊 汇总表写入失败: {}", e),
        }
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("albarán", 10), "albarán");
        assert_eq!(truncate_text("albarán", 5), "albar...");
    }

    #[test]
    fn test_init_log_file_writes_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join(LOG_FILE_NAME);

        init_log_file(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("文档批处理日志"));
    }
}
