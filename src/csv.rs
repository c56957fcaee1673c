use crate::config::StoreConfig;
use crate::records::{format_fee, parse_number, StudentRecord};

/// Spreadsheet hint line; not data.
pub const SEPARATOR_HINT: &str = "sep=,";
/// Rows with fewer fields than this are dropped on import.
pub const MIN_IMPORT_FIELDS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct CsvFormat {
    pub department: String,
    pub currency: String,
}

impl Default for CsvFormat {
    fn default() -> Self {
        CsvFormat::from(&StoreConfig::default())
    }
}

impl From<&StoreConfig> for CsvFormat {
    fn from(cfg: &StoreConfig) -> Self {
        CsvFormat {
            department: cfg.department.clone(),
            currency: cfg.currency.clone(),
        }
    }
}

impl CsvFormat {
    pub fn header(&self) -> Vec<String> {
        let c = &self.currency;
        vec![
            "S.No".to_string(),
            "Roll No".to_string(),
            "Name".to_string(),
            "Semester".to_string(),
            "Department".to_string(),
            "Phone".to_string(),
            "Parent Phone".to_string(),
            "Email".to_string(),
            format!("Total Fees ({c})"),
            format!("Paid Fees ({c})"),
            format!("Remaining Fees ({c})"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the imported text.
    pub line: usize,
    pub fields: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCsv {
    pub records: Vec<StudentRecord>,
    pub skipped: Vec<SkippedRow>,
}

pub fn encode(records: &[StudentRecord], fmt: &CsvFormat) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(records.len() + 2);
    lines.push(SEPARATOR_HINT.to_string());
    lines.push(join_row(fmt.header().iter().map(String::as_str)));

    for (i, r) in records.iter().enumerate() {
        let row_no = (i + 1).to_string();
        let total = format!("{}{}", fmt.currency, format_fee(r.total_fees));
        let paid = format!("{}{}", fmt.currency, format_fee(r.paid_fees));
        let remaining = format!("{}{}", fmt.currency, format_fee(r.remaining_fees()));
        lines.push(join_row([
            row_no.as_str(),
            r.roll.as_str(),
            r.name.as_str(),
            r.semester.as_str(),
            fmt.department.as_str(),
            r.phone.as_str(),
            r.parent_phone.as_str(),
            r.email.as_str(),
            total.as_str(),
            paid.as_str(),
            remaining.as_str(),
        ]));
    }

    lines.join("\n")
}

pub fn decode(text: &str, fmt: &CsvFormat) -> DecodedCsv {
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    let mut rows = read_records(text)
        .into_iter()
        .filter(|(_, fields)| !is_blank_record(fields))
        .peekable();

    if let Some((_, first)) = rows.peek() {
        if first[0].trim_start().starts_with("sep=") {
            rows.next();
        }
    }
    // Header: discarded without checking column names.
    rows.next();

    for (line_no, fields) in rows {
        let cols: Vec<String> = fields.iter().map(|c| c.trim().to_string()).collect();
        if cols.len() < MIN_IMPORT_FIELDS {
            skipped.push(SkippedRow {
                line: line_no,
                fields: cols.len(),
            });
            continue;
        }
        records.push(StudentRecord {
            roll: cols[1].clone(),
            name: cols[2].clone(),
            semester: cols[3].clone(),
            phone: cols[5].clone(),
            parent_phone: cols[6].clone(),
            email: cols[7].clone(),
            total_fees: parse_fee(&cols[8], &fmt.currency),
            paid_fees: parse_fee(&cols[9], &fmt.currency),
        });
    }

    DecodedCsv { records, skipped }
}

fn is_blank_record(fields: &[String]) -> bool {
    fields.len() == 1 && fields[0].trim().is_empty()
}

/// Splits `text` into records, each tagged with the 1-based line it starts on.
///
/// A quote at the start of a field opens a quoted section that may span lines;
/// inside it `""` is a literal quote. Any other quote is dropped, which is how
/// rows from exporters that never escaped quotes come through.
fn read_records(text: &str) -> Vec<(usize, Vec<String>)> {
    let mut out: Vec<(usize, Vec<String>)> = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut record_line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    buf.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    buf.push(ch);
                }
                _ => buf.push(ch),
            }
            continue;
        }
        match ch {
            '"' => {
                if buf.trim().is_empty() {
                    buf.clear();
                    in_quotes = true;
                }
            }
            ',' => fields.push(std::mem::take(&mut buf)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut buf));
                out.push((record_line, std::mem::take(&mut fields)));
                line += 1;
                record_line = line;
            }
            _ => buf.push(ch),
        }
    }
    if !buf.is_empty() || !fields.is_empty() {
        fields.push(buf);
        out.push((record_line, fields));
    }
    out
}

fn parse_fee(field: &str, currency: &str) -> f64 {
    if currency.is_empty() {
        return parse_number(field);
    }
    parse_number(&field.replacen(currency, "", 1))
}

fn join_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(csv_quote)
        .collect::<Vec<_>>()
        .join(",")
}

/// Every cell is wrapped; embedded quotes are doubled.
fn csv_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
