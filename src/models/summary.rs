/// 汇总表的一行（一个废弃物条目，单据级字段在每行重复）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationRow {
    pub filename: String,
    pub supplier: Option<String>,
    pub site: Option<String>,
    pub plant_type: Option<String>,
    pub code: Option<String>,
    pub item_type: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub confidence_pct: Option<f64>,
    pub notes: Option<String>,
}

/// 失败文件记录
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRow {
    pub filename: String,
    pub error: String,
}

impl ErrorRow {
    pub fn new(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            error: error.into(),
        }
    }
}
