use crate::error::{AppResult, ConfigError};
use crate::models::prompt::PromptSpec;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// prompt 目录：prompt_key → PromptSpec
pub type PromptCatalog = BTreeMap<String, PromptSpec>;

/// 从 TOML 文件加载 prompt 目录
pub async fn load_prompt_catalog(toml_file_path: &Path) -> AppResult<PromptCatalog> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| catalog_error(toml_file_path, e))?;

    let catalog = parse_prompt_catalog(&content).map_err(|e| catalog_error(toml_file_path, e))?;

    tracing::info!(
        "已加载 prompt 目录: {} ({} 个)",
        toml_file_path.display(),
        catalog.len()
    );

    Ok(catalog)
}

/// 解析 TOML 文本，每个顶层表是一个 prompt
pub fn parse_prompt_catalog(content: &str) -> Result<PromptCatalog, toml::de::Error> {
    let raw: BTreeMap<String, PromptSpec> = toml::from_str(content)?;
    Ok(raw
        .into_iter()
        .map(|(key, spec)| (key.trim().to_string(), spec.normalized()))
        .collect())
}

fn catalog_error(
    path: &Path,
    source: impl std::error::Error + Send + Sync + 'static,
) -> ConfigError {
    ConfigError::CatalogLoadFailed {
        path: path.display().to_string(),
        source: Box::new(source),
    }
}
