//! CSV and JSON export, and CSV import, for registration data.
//!
//! The CSV layout matches the reception desk's spreadsheet workflow: a
//! fixed Japanese header row, every field double-quoted with embedded
//! quotes doubled, timestamps rendered in the configured local offset.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::registration::{Registration, RegistrationForm};

/// Column headers of the registration CSV, in export order.
pub const CSV_HEADERS: [&str; 14] = [
    "ID",
    "イベントID",
    "氏名",
    "フリガナ",
    "メールアドレス",
    "電話番号",
    "会社名",
    "部署",
    "役職",
    "ステータス",
    "申込日時",
    "チェックイン日時",
    "QRコード",
    "備考",
];

/// Render registrations as CSV.
///
/// Returns `None` when there is nothing to export; otherwise the header
/// row followed by one row per record, in the given order. Every field is
/// double-quoted and embedded quotes are doubled, so free text with commas
/// or quotes survives a spreadsheet round-trip.
#[must_use]
pub fn export_csv(registrations: &[Registration], offset: FixedOffset) -> Option<String> {
    if registrations.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(registrations.len() + 1);
    lines.push(
        CSV_HEADERS
            .iter()
            .map(|h| csv_field(h))
            .collect::<Vec<_>>()
            .join(","),
    );

    for reg in registrations {
        let registered_at = format_local(reg.registered_at, offset);
        let check_in = reg
            .check_in_time
            .map(|t| format_local(t, offset))
            .unwrap_or_default();

        let fields = [
            reg.id.as_str(),
            reg.event_id.as_str(),
            reg.name.as_str(),
            reg.furigana.as_str(),
            reg.email.as_str(),
            reg.phone.as_str(),
            reg.company.as_str(),
            reg.department.as_str(),
            reg.position.as_str(),
            reg.status.label(),
            registered_at.as_str(),
            check_in.as_str(),
            reg.qr_code.as_str(),
            reg.notes.as_str(),
        ];
        lines.push(
            fields
                .iter()
                .map(|f| csv_field(f))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    Some(lines.join("\n"))
}

/// Serialize registrations as a pretty-printed JSON document.
///
/// The document wraps the records in an envelope recording when the
/// export was made and how many records it holds.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export_json(registrations: &[Registration]) -> Result<String> {
    let envelope = ExportEnvelope {
        export_date: Utc::now(),
        data_type: "registrations",
        count: registrations.len(),
        data: registrations,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse a registration CSV back into forms.
///
/// Columns are located by their Japanese header names, so column order
/// does not matter. Every parsed row is assigned to `event_id`. Rows
/// missing a name or email are skipped with a logged warning, matching
/// the desk's habit of importing partially filled sheets.
///
/// # Errors
///
/// Returns [`Error::CsvParse`] when the input has no header row, lacks
/// the 氏名 or メールアドレス column, or contains an unterminated quoted
/// field.
pub fn import_csv(text: &str, event_id: &str) -> Result<Vec<RegistrationForm>> {
    let rows = parse_csv(text)?;
    let Some((header, data_rows)) = rows.split_first() else {
        return Err(Error::CsvParse {
            line: 1,
            message: "missing header row".to_string(),
        });
    };

    let col = |name: &str| header.iter().position(|h| h == name);
    let name_col = col("氏名").ok_or_else(|| Error::CsvParse {
        line: 1,
        message: "missing 氏名 column".to_string(),
    })?;
    let email_col = col("メールアドレス").ok_or_else(|| Error::CsvParse {
        line: 1,
        message: "missing メールアドレス column".to_string(),
    })?;
    let furigana_col = col("フリガナ");
    let phone_col = col("電話番号");
    let company_col = col("会社名");
    let department_col = col("部署");
    let position_col = col("役職");

    let cell = |row: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    let mut forms = Vec::new();
    for (i, row) in data_rows.iter().enumerate() {
        let name = cell(row, Some(name_col));
        let email = cell(row, Some(email_col));
        if name.trim().is_empty() || email.trim().is_empty() {
            warn!("Skipping CSV row {}: name or email missing", i + 2);
            continue;
        }

        forms.push(RegistrationForm {
            event_id: event_id.to_string(),
            name,
            furigana: cell(row, furigana_col),
            email,
            phone: cell(row, phone_col),
            company: cell(row, company_col),
            department: cell(row, department_col),
            position: cell(row, position_col),
            notes: String::new(),
        });
    }

    Ok(forms)
}

/// Render a timestamp in the given fixed offset as `YYYY/MM/DD HH:MM:SS`.
#[must_use]
pub fn format_local(timestamp: DateTime<Utc>, offset: FixedOffset) -> String {
    timestamp
        .with_timezone(&offset)
        .format("%Y/%m/%d %H:%M:%S")
        .to_string()
}

/// Envelope wrapping a JSON export.
#[derive(Debug, Serialize)]
struct ExportEnvelope<'a> {
    /// When the export was produced.
    export_date: DateTime<Utc>,
    /// What kind of records the export holds.
    data_type: &'static str,
    /// Number of records.
    count: usize,
    /// The records themselves.
    data: &'a [Registration],
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Split CSV text into rows of fields.
///
/// Handles quoted fields, doubled-quote escapes, embedded commas and
/// newlines, and CRLF line endings. Blank lines are dropped.
fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\r' => {}
                '\n' => {
                    line += 1;
                    row.push(std::mem::take(&mut field));
                    if row.len() == 1 && row[0].is_empty() {
                        row.clear();
                    } else {
                        rows.push(std::mem::take(&mut row));
                    }
                }
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err(Error::CsvParse {
            line,
            message: "unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}
