pub mod extraction;
pub mod llm_service;
pub mod output_writer;
pub mod prompt_registry;
pub mod summary_writer;

pub use extraction::ExtractionPort;
pub use llm_service::LlmService;
pub use output_writer::{error_path_for, JsonOutputWriter, OutputSink, WriteOutcome};
pub use prompt_registry::{PromptRegistry, TomlPromptRegistry};
pub use summary_writer::{SummarySink, XlsxSummaryWriter};
