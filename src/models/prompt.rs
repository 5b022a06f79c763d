use serde::Deserialize;

/// 输出模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum OutputMode {
    /// 每个输入文件写一个 JSON
    #[default]
    #[serde(rename = "json_per_file")]
    PerFile,
    /// 整个批次汇总为一张表
    #[serde(rename = "excel_summary")]
    AggregatedSummary,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::PerFile => "json_per_file",
            OutputMode::AggregatedSummary => "excel_summary",
        }
    }
}

/// 一条 prompt 配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PromptSpec {
    #[serde(rename = "system", default)]
    pub system_instructions: String,
    #[serde(rename = "task", default)]
    pub task_text: String,
    #[serde(default)]
    pub schema_hint: String,
    #[serde(rename = "schema", default = "default_schema_name")]
    pub schema_name: String,
    #[serde(default)]
    pub output_mode: OutputMode,
    /// 仅在汇总模式下使用
    #[serde(rename = "excel_filename", default)]
    pub aggregate_filename: Option<String>,
}

fn default_schema_name() -> String {
    "documento_ocr".to_string()
}

impl PromptSpec {
    /// 去掉首尾空白，空文件名视为未设置
    pub fn normalized(mut self) -> Self {
        self.system_instructions = self.system_instructions.trim().to_string();
        self.task_text = self.task_text.trim().to_string();
        self.schema_hint = self.schema_hint.trim().to_string();
        self.schema_name = self.schema_name.trim().to_string();
        self.aggregate_filename = self
            .aggregate_filename
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        self
    }

    /// 用户消息文本：任务说明 + schema 提示（忽略空段）
    pub fn user_text(&self) -> String {
        [self.task_text.as_str(), self.schema_hint.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(task: &str, hint: &str) -> PromptSpec {
        PromptSpec {
            system_instructions: String::new(),
            task_text: task.to_string(),
            schema_hint: hint.to_string(),
            schema_name: default_schema_name(),
            output_mode: OutputMode::PerFile,
            aggregate_filename: None,
        }
    }

    #[test]
    fn test_user_text_joins_non_empty_parts() {
        assert_eq!(spec("extrae", "usa JSON").user_text(), "extrae\n\nusa JSON");
        assert_eq!(spec("extrae", "").user_text(), "extrae");
        assert_eq!(spec("", "").user_text(), "");
    }

    #[test]
    fn test_normalized_drops_blank_filename() {
        let mut s = spec("  t  ", "");
        s.aggregate_filename = Some("   ".to_string());
        let s = s.normalized();
        assert_eq!(s.task_text, "t");
        assert_eq!(s.aggregate_filename, None);
    }
}
