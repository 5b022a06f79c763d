//! Prompt 注册表 - 业务能力层
//!
//! 只负责"按 prompt_key 取配置"能力

use crate::error::{AppResult, ConfigError};
use crate::models::loaders::{load_prompt_catalog, parse_prompt_catalog, PromptCatalog};
use crate::models::prompt::PromptSpec;
use std::path::Path;

/// prompt 查找能力
pub trait PromptRegistry: Send + Sync {
    /// 查找 prompt，不存在时返回列出可用 key 的配置错误
    fn get(&self, prompt_key: &str) -> AppResult<PromptSpec>;

    /// 已注册的 key（有序）
    fn keys(&self) -> Vec<String>;
}

/// 基于 TOML 目录的注册表，启动时一次性加载
#[derive(Debug, Clone, Default)]
pub struct TomlPromptRegistry {
    catalog: PromptCatalog,
}

impl TomlPromptRegistry {
    pub fn new(catalog: PromptCatalog) -> Self {
        Self { catalog }
    }

    /// 从文件加载
    pub async fn load(path: &Path) -> AppResult<Self> {
        Ok(Self::new(load_prompt_catalog(path).await?))
    }

    /// 从 TOML 文本构建
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let catalog = parse_prompt_catalog(content).map_err(|e| ConfigError::CatalogLoadFailed {
            path: "<inline>".to_string(),
            source: Box::new(e),
        })?;
        Ok(Self::new(catalog))
    }
}

impl PromptRegistry for TomlPromptRegistry {
    fn get(&self, prompt_key: &str) -> AppResult<PromptSpec> {
        self.catalog.get(prompt_key).cloned().ok_or_else(|| {
            ConfigError::PromptNotFound {
                key: prompt_key.to_string(),
                available: self.keys(),
            }
            .into()
        })
    }

    fn keys(&self) -> Vec<String> {
        self.catalog.keys().cloned().collect()
    }
}
