use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::orchestrator::{BatchProcessor, BatchReport, BatchRequest};
use crate::services::{JsonOutputWriter, LlmService, TomlPromptRegistry, XlsxSummaryWriter};
use crate::utils::logging;
use crate::workflow::FileFlow;

/// 应用主结构
pub struct App {
    config: Config,
    processor: BatchProcessor,
}

impl App {
    /// 初始化应用：加载 prompt 目录、创建 LLM 客户端和输出写入器
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let prompts = TomlPromptRegistry::load(Path::new(&config.prompts_path))
            .await
            .with_context(|| format!("加载 prompt 目录失败: {}", config.prompts_path))?;
        let llm = LlmService::new(&config).context("创建 LLM 服务失败")?;
        info!("✓ LLM 服务就绪 (model: {})", llm.model_name());

        let flow = FileFlow::new(Arc::new(prompts), Arc::new(llm));
        let processor = BatchProcessor::new(
            flow,
            Arc::new(JsonOutputWriter::new()),
            Arc::new(XlsxSummaryWriter::new()),
            config.summary_filename.clone(),
        );

        Ok(Self { config, processor })
    }

    /// 由配置构建批处理参数，输入输出目录转为绝对路径
    pub fn batch_request(&self) -> Result<BatchRequest> {
        Ok(BatchRequest {
            prompt_key: self.config.prompt_key.clone(),
            input_root: absolute(&self.config.input_dir)?,
            output_root: absolute(&self.config.output_dir)?,
            max_file_mb: self.config.max_file_mb,
            overwrite: self.config.overwrite_output,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<BatchReport> {
        let request = self.batch_request()?;
        let report = self.processor.run(&request).await?;
        Ok(report)
    }
}

fn absolute(dir: &str) -> Result<PathBuf> {
    std::path::absolute(dir).with_context(|| format!("无法解析路径: {}", dir))
}
