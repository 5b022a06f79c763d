pub mod file_ctx;
pub mod file_flow;

pub use file_ctx::{FileOutcome, FileProcessingRequest, FileProcessingResult};
pub use file_flow::{build_output_path, FileFlow};
