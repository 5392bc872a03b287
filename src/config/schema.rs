//! # Typed Widget Schemas
//!
//! Each widget type reads its fields out of the generic parsed config
//! defensively: every field is type-checked, malformed or unknown entries are
//! dropped, and anything missing falls back to a documented default. A bad
//! field never takes its siblings down with it, and reading never fails.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::WidgetKind;

/// A validated widget config, one variant per widget type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WidgetConfig {
    Table(TableConfig),
    Graph(GraphConfig),
    Text(TextConfig),
    PageBreak,
}

impl WidgetConfig {
    /// Validate a parsed config for the given widget type.
    pub fn from_value(kind: WidgetKind, value: Option<&Value>) -> Self {
        let map = value.and_then(Value::as_object);
        match kind {
            WidgetKind::Table => WidgetConfig::Table(TableConfig::from_map(map)),
            WidgetKind::Graph => WidgetConfig::Graph(GraphConfig::from_map(map)),
            WidgetKind::Text => WidgetConfig::Text(TextConfig::from_map(map)),
            WidgetKind::PageBreak => WidgetConfig::PageBreak,
        }
    }
}

// ── Shared field readers ───────────────────────────────────────

fn non_blank(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn finite(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|v| v.is_finite())
}

fn positive_int(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(Value::as_u64)
        .filter(|&v| v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

/// Parse every entry of an array, dropping the ones that don't validate.
/// A missing array or one with no valid entries reads as `None`.
fn parse_list<T>(value: Option<&Value>, parse: impl Fn(&Map<String, Value>) -> Option<T>) -> Option<Vec<T>> {
    let items: Vec<T> = value?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_object().and_then(&parse))
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Implements `from_value` for a string-valued enum.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        #[serde(rename_all = "camelCase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn from_value(value: Option<&Value>) -> Option<Self> {
                match value?.as_str()? {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

string_enum!(Alignment { Left => "left", Center => "center", Right => "right" });
string_enum!(ValueFormat {
    Text => "text",
    Currency => "currency",
    Percent => "percent",
    Number => "number",
    Date => "date",
    Rating => "rating",
});
string_enum!(ColumnEmphasis { Primary => "primary", Secondary => "secondary", Muted => "muted" });
string_enum!(CellEmphasis { Positive => "positive", Negative => "negative", Neutral => "neutral" });
string_enum!(ChartType { Line => "line", Bar => "bar", Area => "area", Pie => "pie" });
string_enum!(TextAlignment {
    Left => "left",
    Center => "center",
    Right => "right",
    Justify => "justify",
});

// ── Table ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<TableRow>,
    pub show_header: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Vec<SummaryRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footnote: Option<String>,
    pub responsive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ValueFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<ColumnEmphasis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub id: String,
    pub cells: Vec<TableCell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expandable_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub column_id: String,
    /// Any JSON value; formatting is the renderer's business.
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colspan: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rowspan: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<CellEmphasis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub label: String,
    /// A non-blank string or a number.
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            columns: vec![
                TableColumn {
                    id: "col-metric".to_string(),
                    label: "Metric".to_string(),
                    width: None,
                    align: Some(Alignment::Left),
                    format: Some(ValueFormat::Text),
                    emphasis: None,
                },
                TableColumn {
                    id: "col-value".to_string(),
                    label: "Value".to_string(),
                    width: None,
                    align: Some(Alignment::Right),
                    format: Some(ValueFormat::Number),
                    emphasis: None,
                },
            ],
            rows: vec![TableRow {
                id: "row-example".to_string(),
                cells: vec![
                    TableCell::new("col-metric", Value::from("Example")),
                    TableCell::new("col-value", Value::from(100)),
                ],
                expandable_content: None,
            }],
            show_header: true,
            summary: None,
            footnote: None,
            responsive: true,
        }
    }
}

impl TableCell {
    fn new(column_id: &str, value: Value) -> Self {
        Self {
            column_id: column_id.to_string(),
            value,
            colspan: None,
            rowspan: None,
            emphasis: None,
            tooltip: None,
        }
    }
}

impl TableConfig {
    pub fn from_map(map: Option<&Map<String, Value>>) -> Self {
        let mut config = TableConfig::default();
        let Some(map) = map else {
            return config;
        };

        if let Some(columns) = parse_list(map.get("columns"), parse_column) {
            config.columns = columns;
        }
        if let Some(rows) = parse_list(map.get("rows"), parse_row) {
            config.rows = rows;
        }
        if let Some(Value::Bool(b)) = map.get("showHeader") {
            config.show_header = *b;
        }
        config.summary = parse_list(map.get("summary"), parse_summary_row);
        config.footnote = non_blank(map.get("footnote"));
        if let Some(Value::Bool(b)) = map.get("responsive") {
            config.responsive = *b;
        }
        config
    }
}

fn parse_column(map: &Map<String, Value>) -> Option<TableColumn> {
    Some(TableColumn {
        id: non_blank(map.get("id"))?,
        label: non_blank(map.get("label"))?,
        width: finite(map.get("width")),
        align: Alignment::from_value(map.get("align")),
        format: ValueFormat::from_value(map.get("format")),
        emphasis: ColumnEmphasis::from_value(map.get("emphasis")),
    })
}

fn parse_cell(map: &Map<String, Value>) -> Option<TableCell> {
    Some(TableCell {
        column_id: non_blank(map.get("columnId"))?,
        value: map.get("value").cloned().unwrap_or(Value::Null),
        colspan: positive_int(map.get("colspan")),
        rowspan: positive_int(map.get("rowspan")),
        emphasis: CellEmphasis::from_value(map.get("emphasis")),
        tooltip: non_blank(map.get("tooltip")),
    })
}

fn parse_row(map: &Map<String, Value>) -> Option<TableRow> {
    Some(TableRow {
        id: non_blank(map.get("id"))?,
        cells: parse_list(map.get("cells"), parse_cell)?,
        expandable_content: non_blank(map.get("expandableContent")),
    })
}

fn parse_summary_row(map: &Map<String, Value>) -> Option<SummaryRow> {
    let label = non_blank(map.get("label"))?;
    let value = match map.get("value") {
        Some(Value::String(s)) if !s.trim().is_empty() => Value::String(s.clone()),
        Some(Value::Number(n)) => Value::Number(n.clone()),
        _ => return None,
    };
    Some(SummaryRow {
        label,
        value,
        align: Alignment::from_value(map.get("align")),
    })
}

// ── Graph ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    pub chart_type: ChartType,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub options: GraphOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub id: String,
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphOptions {
    pub legend: bool,
    pub show_grid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
    pub precision: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            legend: true,
            show_grid: true,
            x_axis_label: None,
            y_axis_label: None,
            precision: 0,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            chart_type: ChartType::Bar,
            labels: vec![],
            datasets: vec![],
            options: GraphOptions::default(),
        }
    }
}

/// Maximum number of fraction digits a chart may display.
const MAX_PRECISION: u64 = 6;

impl GraphConfig {
    pub fn from_map(map: Option<&Map<String, Value>>) -> Self {
        let mut config = GraphConfig::default();
        let Some(map) = map else {
            return config;
        };

        if let Some(chart_type) = ChartType::from_value(map.get("chartType")) {
            config.chart_type = chart_type;
        }
        if let Some(Value::Array(labels)) = map.get("labels") {
            config.labels = labels
                .iter()
                .filter_map(|l| l.as_str().map(str::to_string))
                .collect();
        }
        if let Some(datasets) = parse_list(map.get("datasets"), parse_dataset) {
            config.datasets = datasets;
        }
        if let Some(Value::Object(options)) = map.get("options") {
            let opts = &mut config.options;
            if let Some(Value::Bool(b)) = options.get("legend") {
                opts.legend = *b;
            }
            if let Some(Value::Bool(b)) = options.get("showGrid") {
                opts.show_grid = *b;
            }
            opts.x_axis_label = non_blank(options.get("xAxisLabel"));
            opts.y_axis_label = non_blank(options.get("yAxisLabel"));
            if let Some(p) = options
                .get("precision")
                .and_then(Value::as_u64)
                .filter(|&p| p <= MAX_PRECISION)
            {
                opts.precision = p as u32;
            }
        }
        config
    }
}

fn parse_dataset(map: &Map<String, Value>) -> Option<Dataset> {
    let data = map
        .get("data")?
        .as_array()?
        .iter()
        .filter_map(|v| finite(Some(v)))
        .collect();
    Some(Dataset {
        id: non_blank(map.get("id"))?,
        label: non_blank(map.get("label"))?,
        data,
    })
}

// ── Text ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextConfig {
    pub content: String,
    pub rich_text: bool,
    pub alignment: TextAlignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: String::new(),
            rich_text: true,
            alignment: TextAlignment::Left,
            font_size: None,
            line_height: None,
        }
    }
}

impl TextConfig {
    /// Typography lives in `style` next to the engine-owned geometry keys.
    pub fn from_map(map: Option<&Map<String, Value>>) -> Self {
        let mut config = TextConfig::default();
        let Some(map) = map else {
            return config;
        };

        if let Some(Value::String(s)) = map.get("content") {
            config.content = s.clone();
        }
        if let Some(Value::Bool(b)) = map.get("richText") {
            config.rich_text = *b;
        }
        if let Some(Value::Object(style)) = map.get("style") {
            if let Some(a) = TextAlignment::from_value(style.get("alignment")) {
                config.alignment = a;
            }
            config.font_size = finite(style.get("fontSize")).filter(|v| *v > 0.0);
            config.line_height = finite(style.get("lineHeight")).filter(|v| *v > 0.0);
        }
        config
    }
}
