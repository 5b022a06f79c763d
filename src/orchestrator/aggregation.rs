//! 汇总累积器 - 编排层
//!
//! 持有整个批次的汇总行和错误行，只由 batch_processor 独占使用

use crate::models::{AggregationRow, ErrorRow, ExtractedRecord, WasteManifest};

/// 聚合模式下收到非废弃物清单时的错误信息
pub const SCHEMA_MISMATCH_MESSAGE: &str = "聚合模式下 schema 不符: 需要 residuos_documento";

/// 批次内的汇总状态
#[derive(Debug, Default)]
pub struct SummaryAccumulator {
    rows: Vec<AggregationRow>,
    errors: Vec<ErrorRow>,
    /// 一旦出现聚合模式即保持为 true
    observed: bool,
    /// 第一个聚合模式文件声明的汇总文件名
    filename: Option<String>,
}

impl SummaryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记本批次使用了聚合模式
    pub fn observe(&mut self, aggregate_filename: Option<&str>) {
        if !self.observed {
            self.observed = true;
            self.filename = aggregate_filename
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string);
        }
    }

    pub fn push_error(&mut self, filename: impl Into<String>, error: impl Into<String>) {
        self.errors.push(ErrorRow::new(filename, error));
    }

    /// 展开一个成功的抽取结果
    ///
    /// # 返回
    /// 追加的行数；schema 不符时记为错误行并返回 0
    pub fn push_record(&mut self, filename: &str, record: &ExtractedRecord) -> usize {
        match record {
            ExtractedRecord::WasteManifest(manifest) => {
                let rows = expand_manifest(filename, manifest);
                let count = rows.len();
                self.rows.extend(rows);
                count
            }
            ExtractedRecord::Document(_) => {
                self.push_error(filename, SCHEMA_MISMATCH_MESSAGE);
                0
            }
        }
    }

    pub fn is_observed(&self) -> bool {
        self.observed
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn rows(&self) -> &[AggregationRow] {
        &self.rows
    }

    pub fn errors(&self) -> &[ErrorRow] {
        &self.errors
    }
}

/// K 个条目 → K 行；0 个条目 → 1 行占位（条目字段为空）
pub fn expand_manifest(filename: &str, manifest: &WasteManifest) -> Vec<AggregationRow> {
    let base = AggregationRow {
        filename: filename.to_string(),
        supplier: manifest.supplier.clone(),
        site: manifest.site.clone(),
        plant_type: manifest.plant_type.map(|p| p.as_str().to_string()),
        confidence_pct: manifest.confidence_pct,
        notes: manifest.notes.clone(),
        ..Default::default()
    };

    if manifest.items.is_empty() {
        return vec![base];
    }

    manifest
        .items
        .iter()
        .map(|item| AggregationRow {
            code: item.code.clone(),
            item_type: item.waste_type.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            ..base.clone()
        })
        .collect()
}
