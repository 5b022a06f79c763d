/// 程序配置
///
/// 只在启动时构建一次，之后以只读方式传入各层
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub openai_api_key: String,
    pub openai_api_base_url: String,
    pub openai_model: String,
    // --- Prompt 目录 ---
    /// prompt 目录文件 (TOML)
    pub prompts_path: String,
    /// 默认使用的 prompt
    pub prompt_key: String,
    // --- 批处理 ---
    pub input_dir: String,
    pub output_dir: String,
    /// 单个文件大小上限 (MB)
    pub max_file_mb: u64,
    /// 已存在的输出是否覆盖
    pub overwrite_output: bool,
    /// 汇总表默认文件名
    pub summary_filename: String,
    // --- 日志 ---
    pub log_level: String,
    pub log_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_api_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o-2024-08-06".to_string(),
            prompts_path: "config/prompts.toml".to_string(),
            prompt_key: "albaran_factura_es".to_string(),
            input_dir: "input".to_string(),
            output_dir: "output".to_string(),
            max_file_mb: 20,
            overwrite_output: false,
            summary_filename: "residuos_resumen.xlsx".to_string(),
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or(default.openai_api_key),
            openai_api_base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(default.openai_api_base_url),
            openai_model: std::env::var("OPENAI_MODEL")
                .or_else(|_| std::env::var("OPENAI_MODEL_NAME"))
                .unwrap_or(default.openai_model),
            prompts_path: std::env::var("PROMPTS_PATH").unwrap_or(default.prompts_path),
            prompt_key: std::env::var("PROMPT_KEY").unwrap_or(default.prompt_key),
            input_dir: std::env::var("INPUT_DIR").unwrap_or(default.input_dir),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            max_file_mb: std::env::var("MAX_FILE_MB").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_file_mb),
            overwrite_output: std::env::var("OVERWRITE_OUTPUT").ok().and_then(|v| parse_bool(&v)).unwrap_or(default.overwrite_output),
            summary_filename: std::env::var("SUMMARY_FILENAME").unwrap_or(default.summary_filename),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(default.log_level),
            log_dir: std::env::var("LOG_DIR").unwrap_or(default.log_dir),
        }
    }
}

/// 兼容 `true/false/1/0/yes/no`
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
