use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（致命，终止整个批次）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 结构化结果不符合 schema
    #[error("Schema错误: {0}")]
    Schema(#[from] SchemaError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
    /// prompt_key 未注册
    #[error("prompt_key '{key}' 不存在。可用: {}", .available.join(", "))]
    PromptNotFound { key: String, available: Vec<String> },
    /// schema 未注册
    #[error("Schema '{name}' 未注册。可用: {}", .available.join(", "))]
    SchemaNotRegistered { name: String, available: Vec<String> },
    /// prompt 目录无法读取或解析
    #[error("无法加载 prompt 目录 ({path}): {source}")]
    CatalogLoadFailed {
        path: String,
        #[source]
        source: BoxError,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: BoxError,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: BoxError,
    },
    /// 文件超过大小限制
    #[error("文件过大 ({size_mb:.2} MB) > MAX_FILE_MB={limit_mb}")]
    TooLarge { size_mb: f64, limit_mb: u64 },
    /// 目录扫描失败
    #[error("扫描目录失败 ({path}): {source}")]
    ScanFailed {
        path: String,
        #[source]
        source: BoxError,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 请求构建失败
    #[error("LLM 请求构建失败: {source}")]
    RequestBuildFailed {
        #[source]
        source: BoxError,
    },
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: BoxError,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 结构化结果错误
#[derive(Debug, Error)]
pub enum SchemaError {
    /// JSON 无法解析为目标 schema
    #[error("无法解析为 {schema}: {source}")]
    ParseFailed {
        schema: String,
        #[source]
        source: serde_json::Error,
    },
    /// 字段取值越界
    #[error("{field} 超出范围 [0, 100]: {value}")]
    OutOfRange { field: String, value: f64 },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 是否为配置类错误
    ///
    /// 配置错误不会被单个文件吸收，而是终止整个批次
    pub fn is_config(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
