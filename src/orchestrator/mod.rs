//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文件处理器
//! - 扫描输入目录（Vec<PathBuf>）
//! - 逐个文件调用 FileFlow
//! - 按输出模式写单文件结果或累积汇总行
//! - 批次结束时写汇总表，返回全部结果
//!
//! ### `aggregation` - 汇总累积器
//! - 废弃物清单展开为汇总行
//! - 错误行收集
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<文件>)
//!     ↓
//! workflow::FileFlow (处理单个文件)
//!     ↓
//! services (能力层：prompt / llm / output / summary)
//!     ↓
//! infrastructure (基础设施：InputScanner)
//! ```
//!
//! ## 设计原则
//!
//! 1. **顺序处理**：上一个文件完成后才处理下一个
//! 2. **失败隔离**：单个文件失败不影响批次
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure

pub mod aggregation;
pub mod batch_processor;

// 重新导出主要类型
pub use aggregation::SummaryAccumulator;
pub use batch_processor::{BatchProcessor, BatchReport, BatchRequest, SummaryReport};
