pub mod toml_loader;

pub use toml_loader::{load_prompt_catalog, parse_prompt_catalog, PromptCatalog};
