//! 结构化输出的 schema 注册表
//!
//! prompt 中的 `schema` 名称在这里解析为强类型的 [`SchemaKind`]，
//! 同时提供发给 LLM 的严格 JSON Schema。

use serde_json::{json, Value as JsonValue};

use crate::error::{AppResult, ConfigError};

/// 已注册的 schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// 通用单据：表头 + 明细行
    Document,
    /// 废弃物清单：供应商/工地信息 + 废弃物条目
    WasteManifest,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 2] = [SchemaKind::Document, SchemaKind::WasteManifest];

    /// 根据 prompt 中声明的名称查找 schema
    pub fn from_name(name: &str) -> AppResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name.trim())
            .ok_or_else(|| {
                let mut available: Vec<String> =
                    Self::ALL.iter().map(|k| k.name().to_string()).collect();
                available.sort();
                ConfigError::SchemaNotRegistered {
                    name: name.to_string(),
                    available,
                }
                .into()
            })
    }

    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Document => "documento_ocr",
            SchemaKind::WasteManifest => "residuos_documento",
        }
    }

    /// strict 模式的 JSON Schema（所有字段必填，可空字段用 null 表示）
    pub fn json_schema(&self) -> JsonValue {
        match self {
            SchemaKind::Document => document_schema(),
            SchemaKind::WasteManifest => waste_manifest_schema(),
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn nullable(kind: &str) -> JsonValue {
    json!({ "type": [kind, "null"] })
}

fn object(properties: &[(&str, JsonValue)]) -> JsonValue {
    let required: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
    let props: serde_json::Map<String, JsonValue> = properties
        .iter()
        .map(|(name, schema)| (name.to_string(), schema.clone()))
        .collect();
    json!({
        "type": "object",
        "properties": props,
        "required": required,
        "additionalProperties": false,
    })
}

fn document_schema() -> JsonValue {
    let header = object(&[
        ("proveedor_nombre", nullable("string")),
        ("proveedor_cif", nullable("string")),
        ("fecha", nullable("string")),
        ("numero_albaran", nullable("string")),
        ("forma_pago", nullable("string")),
        ("obra_codigo", nullable("string")),
        ("obra_nombre", nullable("string")),
        ("obra_direccion", nullable("string")),
        ("id", nullable("string")),
    ]);
    let line = object(&[
        ("id", nullable("string")),
        ("cabecera_id", nullable("string")),
        ("codigo", nullable("string")),
        ("cantidad", nullable("number")),
        ("concepto", nullable("string")),
        ("precio", nullable("number")),
        ("descuento", nullable("number")),
        ("precio_neto", nullable("number")),
        ("codigo_imputacion", nullable("string")),
        ("confianza_pct", nullable("number")),
    ]);
    object(&[
        ("cabecera", header),
        ("lineas", json!({ "type": "array", "items": line })),
    ])
}

fn waste_manifest_schema() -> JsonValue {
    let item = object(&[
        ("ler", nullable("string")),
        ("tipo_residuo", nullable("string")),
        ("cantidad", nullable("number")),
        ("unidad", nullable("string")),
    ]);
    object(&[
        ("proveedor", nullable("string")),
        ("fecha_documento", nullable("string")),
        ("periodo_inicio", nullable("string")),
        ("periodo_fin", nullable("string")),
        ("obra", nullable("string")),
        (
            "planta_tipo",
            json!({ "type": ["string", "null"], "enum": ["R5", "R12", null] }),
        ),
        ("residuos", json!({ "type": "array", "items": item })),
        ("confianza_pct", nullable("number")),
        ("observaciones", nullable("string")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_known() {
        assert_eq!(
            SchemaKind::from_name("residuos_documento").unwrap(),
            SchemaKind::WasteManifest
        );
        assert_eq!(
            SchemaKind::from_name(" documento_ocr ").unwrap(),
            SchemaKind::Document
        );
    }

    #[test]
    fn test_from_name_unknown_is_config_error() {
        let err = SchemaKind::from_name("facturas").unwrap_err();
        assert!(err.is_config());
        let msg = err.to_string();
        assert!(msg.contains("facturas"));
        assert!(msg.contains("documento_ocr, residuos_documento"));
    }

    #[test]
    fn test_schemas_are_strict() {
        for kind in SchemaKind::ALL {
            let schema = kind.json_schema();
            assert_eq!(schema["additionalProperties"], json!(false));
            let props = schema["properties"].as_object().unwrap();
            let required = schema["required"].as_array().unwrap();
            assert_eq!(props.len(), required.len());
        }
    }
}
