use chrono::{DateTime, NaiveDate, NaiveDateTime};
use super::types::{CellValue, Column, ColumnType};

/// Spellings read as missing, matching the default NA set of common
/// dataframe readers.
const MISSING_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const DATETIME_FORMATS: [&str; 14] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y%m%dT%H%M%S",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// A cell as read from the source, before the column type is decided.
/// CSV only produces `Empty` and `Text`; spreadsheets carry native types.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl RawCell {
    /// Trims the text and maps blanks and NA spellings to `Empty`.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_missing_token(trimmed) {
            RawCell::Empty
        } else {
            RawCell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }

    /// Converts the cell to `column_type`, or `None` if it cannot be
    /// represented. `Empty` always becomes `Missing`.
    pub fn coerce(&self, column_type: ColumnType) -> Option<CellValue> {
        if self.is_empty() {
            return Some(CellValue::Missing);
        }

        match column_type {
            ColumnType::Integer => match self {
                RawCell::Int(i) => Some(CellValue::Integer(*i)),
                RawCell::Float(f) => float_as_integer(*f).map(CellValue::Integer),
                RawCell::Text(s) => parse_integer(s).map(CellValue::Integer),
                _ => None,
            },
            ColumnType::Float => match self {
                RawCell::Int(i) => Some(CellValue::Float(*i as f64)),
                RawCell::Float(f) => Some(CellValue::Float(*f)),
                RawCell::Text(s) => parse_float(s).map(CellValue::Float),
                _ => None,
            },
            ColumnType::Boolean => match self {
                RawCell::Bool(b) => Some(CellValue::Boolean(*b)),
                RawCell::Text(s) => parse_boolean(s).map(CellValue::Boolean),
                _ => None,
            },
            ColumnType::Datetime => match self {
                RawCell::DateTime(dt) => Some(CellValue::DateTime(*dt)),
                RawCell::Text(s) => parse_datetime(s).map(CellValue::DateTime),
                _ => None,
            },
            ColumnType::Text => Some(self.to_text()),
        }
    }

    fn to_text(&self) -> CellValue {
        match self {
            RawCell::Empty => CellValue::Missing,
            RawCell::Text(s) => CellValue::Text(s.clone()),
            RawCell::Int(i) => CellValue::Text(i.to_string()),
            RawCell::Float(f) => CellValue::Text(f.to_string()),
            RawCell::Bool(b) => CellValue::Text(b.to_string()),
            RawCell::DateTime(dt) => CellValue::DateTime(*dt).to_text(),
        }
    }
}

pub fn is_missing_token(trimmed: &str) -> bool {
    trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed)
}

pub fn parse_integer(s: &str) -> Option<i64> {
    s.parse::<i64>().ok()
}

pub fn parse_float(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

pub fn parse_boolean(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    // Offsets are dropped, not applied: the wall-clock reading is kept.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

// i64::MAX is not exactly representable as f64, so the upper bound is exclusive.
fn float_as_integer(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Resolves a column's type with the inference ladder: the first type in
/// `ColumnType::INFERENCE_ORDER` that every non-empty cell converts to wins,
/// otherwise the column is text. A column with no values at all is text.
pub fn resolve_column(name: String, cells: &[RawCell]) -> Column {
    if cells.iter().any(|c| !c.is_empty()) {
        for column_type in ColumnType::INFERENCE_ORDER {
            let converted: Option<Vec<CellValue>> =
                cells.iter().map(|cell| cell.coerce(column_type)).collect();
            if let Some(values) = converted {
                return Column::new(name, column_type, values);
            }
        }
    }

    let values = cells.iter().map(RawCell::to_text).collect();
    Column::new(name, ColumnType::Text, values)
}

/// Name used for a header cell that holds nothing.
pub fn unnamed_header(index: usize) -> String {
    format!("Unnamed: {}", index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_cells(values: &[&str]) -> Vec<RawCell> {
        values.iter().map(|v| RawCell::from_text(v)).collect()
    }

    #[test]
    fn blanks_and_na_tokens_are_missing() {
        for raw in ["", "   ", "NA", "null", "NaN", "#N/A", " n/a "] {
            assert_eq!(RawCell::from_text(raw), RawCell::Empty, "{raw:?}");
        }
        assert_eq!(RawCell::from_text(" x "), RawCell::Text("x".to_string()));
    }

    #[test]
    fn integer_column_wins_first() {
        let column = resolve_column("a".to_string(), &text_cells(&["1", "", "-3", "+4"]));
        assert_eq!(column.column_type(), ColumnType::Integer);
        assert_eq!(
            column.values(),
            &[
                CellValue::Integer(1),
                CellValue::Missing,
                CellValue::Integer(-3),
                CellValue::Integer(4)
            ]
        );
    }

    #[test]
    fn mixed_integers_and_decimals_widen_to_float() {
        let column = resolve_column("a".to_string(), &text_cells(&["1", "2.5", "1e3"]));
        assert_eq!(column.column_type(), ColumnType::Float);
        assert_eq!(column.values()[0], CellValue::Float(1.0));
        assert_eq!(column.values()[2], CellValue::Float(1000.0));
    }

    #[test]
    fn non_finite_spellings_are_not_floats() {
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("infinity"), None);
        let column = resolve_column("a".to_string(), &text_cells(&["1.5", "inf"]));
        assert_eq!(column.column_type(), ColumnType::Text);
    }

    #[test]
    fn booleans_are_case_insensitive() {
        let column = resolve_column("flag".to_string(), &text_cells(&["True", "FALSE", "true"]));
        assert_eq!(column.column_type(), ColumnType::Boolean);
        assert_eq!(column.values()[1], CellValue::Boolean(false));
    }

    #[test]
    fn dates_parse_in_several_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        for raw in ["2024-01-31", "2024/01/31", "01/31/2024", "31.01.2024", "2024-01-31T00:00:00Z"] {
            assert_eq!(parse_datetime(raw), Some(expected), "{raw}");
        }
        assert!(parse_datetime("2024-01-31 08:15:30").is_some());
        assert!(parse_datetime("2024-01-31T08:15:30.250").is_some());
        assert_eq!(parse_datetime("not a date"), None);
    }

    #[test]
    fn offset_timestamps_keep_their_wall_clock_time() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap();
        assert_eq!(parse_datetime("2024-01-31T10:00:00+02:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-31T10:00:00-05:00"), Some(expected));
    }

    #[test]
    fn datetime_column_is_inferred() {
        let column = resolve_column("when".to_string(), &text_cells(&["2024-01-01", "", "2024-02-01 10:00"]));
        assert_eq!(column.column_type(), ColumnType::Datetime);
        assert!(column.values()[1].is_missing());
    }

    #[test]
    fn ambiguous_column_falls_back_to_text() {
        let column = resolve_column("v".to_string(), &text_cells(&["1", "true", "2024-01-01", "x"]));
        assert_eq!(column.column_type(), ColumnType::Text);
        assert_eq!(column.values()[0], CellValue::Text("1".to_string()));
    }

    #[test]
    fn all_missing_column_is_text() {
        let column = resolve_column("empty".to_string(), &text_cells(&["", "NA"]));
        assert_eq!(column.column_type(), ColumnType::Text);
        assert!(column.values().iter().all(CellValue::is_missing));
    }

    #[test]
    fn whole_spreadsheet_floats_count_as_integers() {
        let cells = vec![RawCell::Float(1.0), RawCell::Int(2), RawCell::Empty];
        let column = resolve_column("n".to_string(), &cells);
        assert_eq!(column.column_type(), ColumnType::Integer);
        assert_eq!(column.values()[0], CellValue::Integer(1));

        let cells = vec![RawCell::Float(1.5), RawCell::Int(2)];
        assert_eq!(resolve_column("n".to_string(), &cells).column_type(), ColumnType::Float);
    }

    #[test]
    fn heterogeneous_native_cells_fall_back_to_text() {
        let cells = vec![RawCell::Bool(true), RawCell::Int(2)];
        let column = resolve_column("m".to_string(), &cells);
        assert_eq!(column.column_type(), ColumnType::Text);
        assert_eq!(
            column.values(),
            &[CellValue::Text("true".to_string()), CellValue::Text("2".to_string())]
        );
    }
}
