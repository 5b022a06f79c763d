//! # Doc Batch Extractor
//!
//! 批量把扫描件、PDF 交给视觉模型抽取结构化数据的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只暴露能力，不含业务判断
//! - `InputScanner` - 递归扫描输入目录，返回有序文件列表
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文件
//! - `PromptRegistry` - 按 key 查找 prompt
//! - `LlmService` - 视觉模型结构化抽取能力（`ExtractionPort`）
//! - `JsonOutputWriter` - 写单文件 JSON 能力
//! - `XlsxSummaryWriter` - 写汇总表能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的完整处理流程
//! - `FileProcessingRequest` / `FileProcessingResult` - 单文件上下文与结果
//! - `FileFlow` - 流程编排（prompt → 读取 → 大小检查 → 抽取）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，逐个文件调度并分流输出
//! - `orchestrator/aggregation` - 汇总行展开与错误行收集
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::InputScanner;
pub use models::{ExtractedRecord, PromptSpec, SchemaKind};
pub use orchestrator::{BatchProcessor, BatchReport, BatchRequest};
pub use workflow::{FileFlow, FileProcessingRequest, FileProcessingResult};
