//! 汇总表写入服务 - 业务能力层
//!
//! 只负责"把整个批次的行写成一个 XLSX"能力

use async_trait::async_trait;
use rust_xlsxwriter::{Table, TableColumn, TableStyle, Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::{AggregationRow, ErrorRow};
use crate::services::output_writer::WriteOutcome;

/// 条目表列（顺序固定）
pub const ITEM_HEADERS: [&str; 10] = [
    "archivo",
    "proveedor",
    "obra",
    "planta_tipo",
    "ler",
    "tipo_residuo",
    "cantidad",
    "unidad",
    "confianza_pct",
    "observaciones",
];

/// 错误表列
pub const ERROR_HEADERS: [&str; 2] = ["archivo", "error"];

pub const ITEMS_SHEET: &str = "residuos";
pub const ERRORS_SHEET: &str = "errores";

/// 汇总输出能力
#[async_trait]
pub trait SummarySink: Send + Sync {
    async fn write_summary(
        &self,
        path: &Path,
        rows: &[AggregationRow],
        errors: &[ErrorRow],
        overwrite: bool,
    ) -> AppResult<WriteOutcome>;
}

/// 单元格取值
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(value: &Option<String>) -> Self {
        value.clone().map(Cell::Text).unwrap_or(Cell::Empty)
    }

    fn number(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }

    fn display_len(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Number(n) => n.to_string().len(),
            Cell::Empty => 0,
        }
    }
}

fn item_cells(row: &AggregationRow) -> Vec<Cell> {
    vec![
        Cell::Text(row.filename.clone()),
        Cell::text(&row.supplier),
        Cell::text(&row.site),
        Cell::text(&row.plant_type),
        Cell::text(&row.code),
        Cell::text(&row.item_type),
        Cell::number(row.quantity),
        Cell::text(&row.unit),
        Cell::number(row.confidence_pct),
        Cell::text(&row.notes),
    ]
}

fn error_cells(row: &ErrorRow) -> Vec<Cell> {
    vec![Cell::Text(row.filename.clone()), Cell::Text(row.error.clone())]
}

/// 列宽：内容最大长度 + 2，限制在 [10, 60]
fn column_widths(headers: &[&str], rows: &[Vec<Cell>]) -> Vec<f64> {
    headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let max_len = rows
                .iter()
                .filter_map(|cells| cells.get(col))
                .map(Cell::display_len)
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            (max_len + 2).clamp(10, 60) as f64
        })
        .collect()
}

fn fill_sheet(
    sheet: &mut Worksheet,
    name: &str,
    headers: &[&str],
    rows: &[Vec<Cell>],
) -> Result<(), XlsxError> {
    sheet.set_name(name)?;

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }

    for (idx, cells) in rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        for (col, cell) in cells.iter().enumerate() {
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(row, col as u16, s.as_str())?;
                }
                Cell::Number(n) => {
                    sheet.write_number(row, col as u16, *n)?;
                }
                Cell::Empty => {}
            }
        }
    }

    for (col, width) in column_widths(headers, rows).into_iter().enumerate() {
        sheet.set_column_width(col as u16, width)?;
    }

    Ok(())
}

/// 构建工作簿：条目表（非空时加表格样式和筛选）+ 错误表
fn build_workbook(rows: &[AggregationRow], errors: &[ErrorRow]) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();

    let item_rows: Vec<Vec<Cell>> = rows.iter().map(item_cells).collect();
    let mut items = Worksheet::new();
    fill_sheet(&mut items, ITEMS_SHEET, &ITEM_HEADERS, &item_rows)?;

    if !item_rows.is_empty() {
        let columns: Vec<TableColumn> = ITEM_HEADERS
            .iter()
            .map(|h| TableColumn::new().set_header(*h))
            .collect();
        let table = Table::new()
            .set_style(TableStyle::Medium9)
            .set_columns(&columns);
        items.add_table(
            0,
            0,
            item_rows.len() as u32,
            (ITEM_HEADERS.len() - 1) as u16,
            &table,
        )?;
    }
    workbook.push_worksheet(items);

    let error_rows: Vec<Vec<Cell>> = errors.iter().map(error_cells).collect();
    let mut errs = Worksheet::new();
    fill_sheet(&mut errs, ERRORS_SHEET, &ERROR_HEADERS, &error_rows)?;
    workbook.push_worksheet(errs);

    Ok(workbook)
}

/// XLSX 汇总写入器
#[derive(Debug, Clone, Default)]
pub struct XlsxSummaryWriter;

impl XlsxSummaryWriter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SummarySink for XlsxSummaryWriter {
    async fn write_summary(
        &self,
        path: &Path,
        rows: &[AggregationRow],
        errors: &[ErrorRow],
        overwrite: bool,
    ) -> AppResult<WriteOutcome> {
        if !overwrite && tokio::fs::try_exists(path).await.unwrap_or(false) {
            warn!("汇总表已存在且未开启覆盖，跳过: {}", path.display());
            return Ok(WriteOutcome::SkippedExisting);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
        }

        let mut workbook = build_workbook(rows, errors)
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        workbook
            .save(path)
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        Ok(WriteOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(filename: &str, code: Option<&str>) -> AggregationRow {
        AggregationRow {
            filename: filename.to_string(),
            supplier: Some("Reciclados Norte".to_string()),
            code: code.map(str::to_string),
            quantity: code.map(|_| 3.5),
            ..Default::default()
        }
    }

    #[test]
    fn test_item_cells_follow_header_order() {
        let cells = item_cells(&row("a.pdf", Some("170107")));
        assert_eq!(cells.len(), ITEM_HEADERS.len());
        assert_eq!(cells[0], Cell::Text("a.pdf".to_string()));
        assert_eq!(cells[1], Cell::Text("Reciclados Norte".to_string()));
        assert_eq!(cells[2], Cell::Empty);
        assert_eq!(cells[4], Cell::Text("170107".to_string()));
        assert_eq!(cells[6], Cell::Number(3.5));
    }

    #[test]
    fn test_column_widths_are_clamped() {
        let rows = vec![vec![Cell::Text("x".repeat(200)), Cell::Empty]];
        let widths = column_widths(&["archivo", "error"], &rows);
        assert_eq!(widths, vec![60.0, 10.0]);
    }

    #[tokio::test]
    async fn test_write_summary_produces_xlsx() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/resumen.xlsx");

        let writer = XlsxSummaryWriter::new();
        let outcome = writer
            .write_summary(
                &path,
                &[row("a.pdf", Some("170107")), row("c.pdf", None)],
                &[ErrorRow::new("b.jpg", "boom")],
                false,
            )
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Written);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let again = writer.write_summary(&path, &[], &[], false).await.unwrap();
        assert_eq!(again, WriteOutcome::SkippedExisting);
    }

    #[tokio::test]
    async fn test_write_summary_without_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vacio.xlsx");

        let outcome = XlsxSummaryWriter::new()
            .write_summary(&path, &[], &[ErrorRow::new("b.jpg", "boom")], true)
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert!(path.exists());
    }
}
