use super::types::{ColumnType, Table};
use super::utils::{parse_datetime, resolve_column, unnamed_header, RawCell};
use crate::error::ProfileError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::HashSet;
use std::fmt;
use std::io::Cursor;

const CSV_FORMAT: &str = "csv";
const SPREADSHEET_FORMAT: &str = "spreadsheet";

/// Source format, resolved from the file name's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    pub const SUPPORTED_EXTENSIONS: [&'static str; 3] = ["csv", "xlsx", "xls"];

    /// Matches the text after the final `.` case-insensitively.
    pub fn from_file_name(file_name: &str) -> Result<Self, ProfileError> {
        let extension = file_extension(file_name).unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Spreadsheet),
            _ => Err(ProfileError::UnsupportedFormat {
                file_name: file_name.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => CSV_FORMAT,
            FileFormat::Spreadsheet => SPREADSHEET_FORMAT,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased text after the last `.`, if the name has one.
pub fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
}

/// Parses raw upload bytes into a [`Table`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TableLoader;

impl TableLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, data: &[u8], file_name: &str) -> Result<Table, ProfileError> {
        let format = FileFormat::from_file_name(file_name)?;
        tracing::debug!("Loading {} as {} ({} bytes)", file_name, format, data.len());
        self.load_as(data, format)
    }

    pub fn load_as(&self, data: &[u8], format: FileFormat) -> Result<Table, ProfileError> {
        let table = match format {
            FileFormat::Csv => read_csv(data)?,
            FileFormat::Spreadsheet => read_spreadsheet(data)?,
        };
        tracing::debug!(
            "Loaded {} table with {} rows and {} columns",
            format,
            table.row_count(),
            table.column_count()
        );
        Ok(table)
    }
}

fn read_csv(data: &[u8]) -> Result<Table, ProfileError> {
    ensure_quotes_terminated(data)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ProfileError::malformed(CSV_FORMAT, format!("Failed to read CSV headers: {}", e)))?
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let name = if idx == 0 { raw.trim_start_matches('\u{feff}') } else { raw };
            if name.trim().is_empty() {
                unnamed_header(idx)
            } else {
                name.to_string()
            }
        })
        .collect();
    ensure_unique_headers(&headers, CSV_FORMAT)?;

    let width = headers.len();
    let mut cells: Vec<Vec<RawCell>> = vec![Vec::new(); width];
    let mut row_count = 0;

    for result in reader.records() {
        let record = result
            .map_err(|e| ProfileError::malformed(CSV_FORMAT, format!("Failed to read CSV row: {}", e)))?;
        if record.len() > width {
            let line = record.position().map_or(0, |p| p.line());
            return Err(ProfileError::malformed(
                CSV_FORMAT,
                format!("line {} has {} fields, expected {}", line, record.len(), width),
            ));
        }
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(RawCell::from_text(record.get(idx).unwrap_or("")));
        }
        row_count += 1;
    }

    build_table(headers, cells, row_count)
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Rejects input that ends inside a quoted field. The csv reader accepts
/// such input silently and swallows the rest of the file into one field.
fn ensure_quotes_terminated(data: &[u8]) -> Result<(), ProfileError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut line = 1;
    let mut opened_on = 1;
    let mut bytes = data.iter().peekable();

    while let Some(&byte) = bytes.next() {
        if byte == b'\n' {
            line += 1;
        }
        if in_quotes {
            if byte == b'"' {
                if bytes.peek() == Some(&&b'"') {
                    bytes.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        match byte {
            b'"' if at_field_start => {
                in_quotes = true;
                at_field_start = false;
                opened_on = line;
            }
            b',' | b'\n' | b'\r' => at_field_start = true,
            _ => at_field_start = false,
        }
    }

    if in_quotes {
        Err(ProfileError::malformed(
            CSV_FORMAT,
            format!("unterminated quoted field starting on line {}", opened_on),
        ))
    } else {
        Ok(())
    }
}

fn read_spreadsheet(data: &[u8]) -> Result<Table, ProfileError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data)).map_err(|e| {
        tracing::error!("Failed to open spreadsheet: {}", e);
        ProfileError::malformed(SPREADSHEET_FORMAT, format!("Failed to open workbook: {}", e))
    })?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ProfileError::malformed(SPREADSHEET_FORMAT, "No sheets found in workbook"))?;
    tracing::debug!("Reading first sheet: {}", sheet_name);

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        ProfileError::malformed(
            SPREADSHEET_FORMAT,
            format!("Failed to read worksheet {}: {}", sheet_name, e),
        )
    })?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        tracing::warn!("Sheet {} is empty", sheet_name);
        return Ok(Table::empty());
    };

    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| header_name(cell, idx))
        .collect();
    ensure_unique_headers(&headers, SPREADSHEET_FORMAT)?;

    let mut cells: Vec<Vec<RawCell>> = vec![Vec::new(); headers.len()];
    let mut row_count = 0;
    for row in rows {
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(row.get(idx).map_or(RawCell::Empty, raw_cell));
        }
        row_count += 1;
    }

    build_table(headers, cells, row_count)
}

// Text headers are kept verbatim; other cell kinds use their text form.
fn header_name(cell: &Data, idx: usize) -> String {
    match cell {
        Data::String(s) if !s.trim().is_empty() => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => match raw_cell(other) {
            RawCell::Empty => unnamed_header(idx),
            raw => raw
                .coerce(ColumnType::Text)
                .map_or_else(|| unnamed_header(idx), |value| value.to_string()),
        },
    }
}

fn raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => RawCell::from_text(s),
        Data::Int(i) => RawCell::Int(*i),
        Data::Float(f) if f.is_finite() => RawCell::Float(*f),
        Data::Float(_) => RawCell::Empty,
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => RawCell::Float(dt.as_f64()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or_else(|| RawCell::Float(dt.as_f64()), RawCell::DateTime),
        Data::DateTimeIso(s) => match parse_datetime(s) {
            Some(dt) => RawCell::DateTime(dt),
            None => RawCell::from_text(s),
        },
        Data::DurationIso(s) => RawCell::from_text(s),
    }
}

fn ensure_unique_headers(headers: &[String], format: &'static str) -> Result<(), ProfileError> {
    let mut seen = HashSet::new();
    for name in headers {
        if !seen.insert(name.as_str()) {
            return Err(ProfileError::malformed(
                format,
                format!("duplicate column name '{}'", name),
            ));
        }
    }
    Ok(())
}

fn build_table(
    headers: Vec<String>,
    cells: Vec<Vec<RawCell>>,
    row_count: usize,
) -> Result<Table, ProfileError> {
    let columns = headers
        .into_iter()
        .zip(cells.iter())
        .map(|(name, column_cells)| {
            let column = resolve_column(name, column_cells);
            tracing::debug!("Column {} resolved to {}", column.name(), column.column_type());
            column
        })
        .collect();

    Table::new(columns, row_count)
}
