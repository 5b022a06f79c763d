//! 抽取结果模型
//!
//! 字段名保持与 LLM 输出一致（JSON 线上格式），Rust 侧使用语义化命名。

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{AppResult, SchemaError};
use crate::models::schema::SchemaKind;

// ========== 通用单据 ==========

/// 单据表头
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentHeader {
    #[serde(rename = "proveedor_nombre", default)]
    pub supplier_name: Option<String>,
    #[serde(rename = "proveedor_cif", default)]
    pub supplier_tax_id: Option<String>,
    #[serde(rename = "fecha", default)]
    pub date: Option<String>,
    #[serde(rename = "numero_albaran", default)]
    pub delivery_note_number: Option<String>,
    #[serde(rename = "forma_pago", default)]
    pub payment_terms: Option<String>,
    #[serde(rename = "obra_codigo", default)]
    pub site_code: Option<String>,
    #[serde(rename = "obra_nombre", default)]
    pub site_name: Option<String>,
    #[serde(rename = "obra_direccion", default)]
    pub site_address: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// 单据明细行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLine {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "cabecera_id", default)]
    pub header_id: Option<String>,
    #[serde(rename = "codigo", default)]
    pub code: Option<String>,
    #[serde(rename = "cantidad", default)]
    pub quantity: Option<f64>,
    #[serde(rename = "concepto", default)]
    pub description: Option<String>,
    #[serde(rename = "precio", default)]
    pub price: Option<f64>,
    #[serde(rename = "descuento", default)]
    pub discount: Option<f64>,
    #[serde(rename = "precio_neto", default)]
    pub net_price: Option<f64>,
    #[serde(rename = "codigo_imputacion", default)]
    pub cost_code: Option<String>,
    #[serde(rename = "confianza_pct", default)]
    pub confidence_pct: Option<f64>,
}

/// 通用单据（`documento_ocr`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericDocument {
    #[serde(rename = "cabecera")]
    pub header: DocumentHeader,
    #[serde(rename = "lineas")]
    pub lines: Vec<DocumentLine>,
}

// ========== 废弃物清单 ==========

/// 处理厂类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlantType {
    R5,
    R12,
}

impl PlantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlantType::R5 => "R5",
            PlantType::R12 => "R12",
        }
    }
}

/// 单个废弃物条目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WasteItem {
    /// LER 编码
    #[serde(rename = "ler", default)]
    pub code: Option<String>,
    #[serde(rename = "tipo_residuo", default)]
    pub waste_type: Option<String>,
    #[serde(rename = "cantidad", default)]
    pub quantity: Option<f64>,
    #[serde(rename = "unidad", default)]
    pub unit: Option<String>,
}

/// 废弃物清单（`residuos_documento`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WasteManifest {
    #[serde(rename = "proveedor", default)]
    pub supplier: Option<String>,
    #[serde(rename = "fecha_documento", default)]
    pub document_date: Option<String>,
    #[serde(rename = "periodo_inicio", default)]
    pub period_start: Option<String>,
    #[serde(rename = "periodo_fin", default)]
    pub period_end: Option<String>,
    #[serde(rename = "obra", default)]
    pub site: Option<String>,
    #[serde(rename = "planta_tipo", default)]
    pub plant_type: Option<PlantType>,
    #[serde(rename = "residuos", default)]
    pub items: Vec<WasteItem>,
    #[serde(rename = "confianza_pct", default)]
    pub confidence_pct: Option<f64>,
    #[serde(rename = "observaciones", default)]
    pub notes: Option<String>,
}

// ========== 带 schema 标签的抽取结果 ==========

/// 抽取结果，变体由 prompt 声明的 schema 决定
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedRecord {
    Document(GenericDocument),
    WasteManifest(WasteManifest),
}

impl ExtractedRecord {
    /// 按指定 schema 解析 LLM 返回的 JSON 文本
    pub fn parse(schema: SchemaKind, content: &str) -> AppResult<Self> {
        let parse_err = |source| SchemaError::ParseFailed {
            schema: schema.name().to_string(),
            source,
        };

        let record = match schema {
            SchemaKind::Document => {
                let doc: GenericDocument = serde_json::from_str(content).map_err(parse_err)?;
                for line in &doc.lines {
                    check_confidence(line.confidence_pct)?;
                }
                ExtractedRecord::Document(doc)
            }
            SchemaKind::WasteManifest => {
                let manifest: WasteManifest =
                    serde_json::from_str(content).map_err(parse_err)?;
                check_confidence(manifest.confidence_pct)?;
                ExtractedRecord::WasteManifest(manifest)
            }
        };

        Ok(record)
    }

    pub fn schema(&self) -> SchemaKind {
        match self {
            ExtractedRecord::Document(_) => SchemaKind::Document,
            ExtractedRecord::WasteManifest(_) => SchemaKind::WasteManifest,
        }
    }

    /// 序列化为落盘用的 JSON（不带 schema 标签）
    pub fn to_json(&self) -> AppResult<JsonValue> {
        let value = match self {
            ExtractedRecord::Document(doc) => serde_json::to_value(doc),
            ExtractedRecord::WasteManifest(manifest) => serde_json::to_value(manifest),
        };
        value.map_err(|source| {
            SchemaError::ParseFailed {
                schema: self.schema().name().to_string(),
                source,
            }
            .into()
        })
    }
}

fn check_confidence(value: Option<f64>) -> AppResult<()> {
    match value {
        Some(v) if !(0.0..=100.0).contains(&v) => Err(SchemaError::OutOfRange {
            field: "confianza_pct".to_string(),
            value: v,
        }
        .into()),
        _ => Ok(()),
    }
}
