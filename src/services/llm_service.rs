//! LLM 服务 - 业务能力层
//!
//! 只负责"把一个附件交给视觉模型并拿回结构化结果"，不关心批次流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 通过 `response_format` 的 strict JSON Schema 约束输出
//! - 兼容 OpenAI API 的服务（自定义 base url）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartFile,
        ChatCompletionRequestMessageContentPartImage, ChatCompletionRequestMessageContentPartText,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, FileObject, ImageDetail, ImageUrl, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError, LlmError};
use crate::models::{Attachment, AttachmentKind, ExtractedRecord, SchemaKind};
use crate::services::extraction::ExtractionPort;

/// LLM 服务
///
/// 职责：
/// - 组装 system / user 消息（文本 + 附件）
/// - 按 schema 请求结构化输出并解析
/// - 不出现 Vec<文件>，不关心输出落盘
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> AppResult<Self> {
        if config.openai_api_key.trim().is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "OPENAI_API_KEY".to_string(),
            }
            .into());
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_api_base_url);

        Ok(Self {
            client: Client::with_config(openai_config),
            model_name: config.openai_model.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 构建用户消息内容
    ///
    /// PDF 以文件形式放在文本前，图片以 data url 放在文本后
    fn build_user_parts(
        user_text: &str,
        attachment: &Attachment,
    ) -> AppResult<Vec<ChatCompletionRequestUserMessageContentPart>> {
        let text = ChatCompletionRequestUserMessageContentPart::Text(
            ChatCompletionRequestMessageContentPartText {
                text: user_text.to_string(),
            },
        );

        match attachment.kind {
            AttachmentKind::Pdf => {
                // FileObject 的字段不公开，只能经由 Deserialize 构建
                let file_object: FileObject = serde_json::from_value(json!({
                    "file_data": attachment.to_data_url(),
                    "filename": safe_filename(&attachment.filename, "document.pdf"),
                }))
                .map_err(|e| {
                    AppError::Llm(LlmError::RequestBuildFailed {
                        source: Box::new(e),
                    })
                })?;
                let file = ChatCompletionRequestUserMessageContentPart::File(
                    ChatCompletionRequestMessageContentPartFile { file: file_object },
                );
                Ok(vec![file, text])
            }
            AttachmentKind::Image => {
                let image = ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: attachment.to_data_url(),
                            detail: Some(ImageDetail::High),
                        },
                    },
                );
                Ok(vec![text, image])
            }
        }
    }
}

#[async_trait]
impl ExtractionPort for LlmService {
    async fn extract(
        &self,
        instructions: &str,
        task_text: &str,
        attachment: &Attachment,
        schema: SchemaKind,
    ) -> AppResult<ExtractedRecord> {
        info!(
            "调用 LLM: model={} kind={} filename={} mime={} size={} schema={}",
            self.model_name,
            attachment.kind.as_str(),
            attachment.filename,
            attachment.mime_type,
            attachment.data.len(),
            schema
        );

        let mut messages = Vec::new();

        if !instructions.is_empty() {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(instructions)
                .build()
                .map_err(build_failed)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(
                Self::build_user_parts(task_text, attachment)?,
            ))
            .build()
            .map_err(build_failed)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: None,
                name: schema.name().to_string(),
                schema: Some(schema.json_schema()),
                strict: Some(true),
            },
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .response_format(response_format)
            .temperature(0.0)
            .build()
            .map_err(build_failed)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        debug!("LLM 返回 {} 字符", content.len());

        ExtractedRecord::parse(schema, content.trim())
    }
}

fn build_failed(source: async_openai::error::OpenAIError) -> AppError {
    AppError::Llm(LlmError::RequestBuildFailed {
        source: Box::new(source),
    })
}

/// 文件名只保留 `[A-Za-z0-9._-]`，其余替换为 `_`
fn safe_filename(filename: &str, fallback: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

    let cleaned = re.replace_all(filename, "_");
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("albarán 12 (copia).pdf", "document.pdf"), "albar_n_12_copia_.pdf");
        assert_eq!(safe_filename("ok-name_1.pdf", "document.pdf"), "ok-name_1.pdf");
        assert_eq!(safe_filename("ñññ", "document.pdf"), "document.pdf");
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = Config::default();
        let err = LlmService::new(&config).err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_pdf_parts_put_file_first() {
        let att = Attachment::classify(Path::new("mi albarán.pdf"), b"%PDF".to_vec());
        let parts = LlmService::build_user_parts("extrae", &att).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(matches!(
            parts[0],
            ChatCompletionRequestUserMessageContentPart::File(_)
        ));
        assert!(matches!(
            parts[1],
            ChatCompletionRequestUserMessageContentPart::Text(_)
        ));

        let file_part = serde_json::to_value(&parts[0]).unwrap();
        let file_data = file_part["file"]["file_data"].as_str().unwrap();
        assert!(file_data.starts_with("data:application/pdf;base64,"));
        assert_eq!(file_part["file"]["filename"], "mi_albar_n.pdf");
    }

    #[test]
    fn test_image_parts_put_text_first() {
        let att = Attachment::classify(Path::new("a.png"), vec![0u8; 4]);
        let parts = LlmService::build_user_parts("extrae", &att).unwrap();
        match &parts[1] {
            ChatCompletionRequestUserMessageContentPart::ImageUrl(img) => {
                assert!(img.image_url.url.starts_with("data:image/png;base64,"));
            }
            _ => panic!("第二部分应为图片"),
        }
    }

    /// 测试真实 API 调用
    ///
    /// 运行方式：
    /// ```bash
    /// OPENAI_API_KEY=... SAMPLE_FILE=input/x.pdf cargo test test_extract_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_extract_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let service = LlmService::new(&Config::from_env()).expect("需要 OPENAI_API_KEY");
        let sample = std::env::var("SAMPLE_FILE").expect("需要 SAMPLE_FILE");
        let data = std::fs::read(&sample).expect("无法读取样例文件");
        let att = Attachment::classify(Path::new(&sample), data);

        let result = service
            .extract("Eres un extractor.", "Extrae los residuos.", &att, SchemaKind::WasteManifest)
            .await;

        match result {
            Ok(record) => println!("✅ 抽取成功: {:?}", record),
            Err(e) => panic!("❌ 抽取失败: {}", e),
        }
    }
}
