//! Export of the user table as CSV, Excel-friendly CSV and XLSX.

use chrono::{NaiveDate, TimeZone};
use std::error::Error;
use std::fmt;

use crate::user::UserRecord;

/// Column headers shared by every export format.
pub const EXPORT_HEADERS: [&str; 9] = [
    "Name",
    "Email",
    "Phone Number",
    "Address",
    "Barangay",
    "City",
    "Province",
    "Region",
    "Account Created",
];

/// Byte order mark that makes Excel read the CSV as UTF-8.
pub const UTF8_BOM: char = '\u{FEFF}';

const FILENAME_PREFIX: &str = "tulong-users";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    /// CSV with a BOM, saved with an `.xls` extension.
    Excel,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xls",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Excel => "application/vnd.ms-excel;charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// Download name for an export made on `date`.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use tulong_admin::downloader::{ExportFormat, export_filename};
///
/// let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
/// assert_eq!(export_filename(ExportFormat::Excel, date), "tulong-users-2026-10-18.xls");
/// ```
pub fn export_filename(format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "{FILENAME_PREFIX}-{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// One export row in [`EXPORT_HEADERS`] order, blanks rendered as `"N/A"`.
pub fn export_row<Tz>(user: &UserRecord, tz: &Tz) -> [String; 9]
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    [
        user.full_name(),
        user.email().to_string(),
        user.phone_number().to_string(),
        user.address().to_string(),
        user.barangay().to_string(),
        user.city().to_string(),
        user.province().to_string(),
        user.region().to_string(),
        user.created_display(tz),
    ]
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Convert users to CSV
///
/// The header row is written bare; every data field is wrapped in double
/// quotes with embedded quotes doubled. Rows are separated by `\n` with no
/// trailing newline. Dates are rendered in `tz`.
///
/// # Arguments
/// * `users` - Rows to export, in output order
/// * `tz` - Zone used for the "Account Created" column
pub fn to_csv<Tz>(users: &[UserRecord], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut lines = Vec::with_capacity(users.len() + 1);
    lines.push(EXPORT_HEADERS.join(","));

    for user in users {
        let row: Vec<String> = export_row(user, tz).iter().map(|f| quote(f)).collect();
        lines.push(row.join(","));
    }

    lines.join("\n")
}

/// [`to_csv`] prefixed with a UTF-8 byte order mark.
pub fn to_excel_csv<Tz>(users: &[UserRecord], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut content = String::from(UTF8_BOM);
    content.push_str(&to_csv(users, tz));
    content
}

/// Convert users to an XLSX workbook
///
/// Writes a single worksheet with a bold header row followed by one row per
/// user, using the same columns as [`to_csv`].
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
#[cfg(feature = "web")]
pub fn to_xlsx<Tz>(users: &[UserRecord], tz: &Tz) -> Result<Vec<u8>, Box<dyn Error>>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name("Users")?;

    let bold = Format::new().set_bold();
    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (index, user) in users.iter().enumerate() {
        let row = (index + 1) as u32;
        for (col, field) in export_row(user, tz).iter().enumerate() {
            worksheet.write_string(row, col as u16, field)?;
        }
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Parse CSV content into rows of fields.
///
/// Understands quoted fields, doubled quotes and newlines inside quotes, and
/// skips a leading byte order mark. Fails on an unterminated quote.
pub fn parse_csv(content: &str) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    if content.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                row.push(std::mem::take(&mut current_field));
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                row.push(std::mem::take(&mut current_field));
                rows.push(std::mem::take(&mut row));
            }
            _ => current_field.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".into());
    }

    row.push(current_field);
    rows.push(row);

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserData;
    use chrono::Utc;
    use serde_json::json;

    fn user(uid: &str, value: serde_json::Value) -> UserRecord {
        UserRecord::new(uid, UserData::from_value(uid, value))
    }

    fn juan() -> UserRecord {
        user(
            "a",
            json!({
                "FirstName": "Juan",
                "LastName": "Dela Cruz",
                "Email": "juan@example.com",
                "PhoneNumber": "0917 123 4567",
                "Address": "12 Rizal St.",
                "Barangay": "San Jose",
                "City": "Tacloban",
                "Province": "Leyte",
                "Region": "Eastern Visayas",
                "createdAt": "2026-10-18T15:04:00Z",
            }),
        )
    }

    #[test]
    fn csv_layout() {
        let csv = to_csv(&[juan()], &Utc);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Name,Email,Phone Number,Address,Barangay,City,Province,Region,Account Created"
        );
        assert_eq!(
            lines[1],
            "\"Juan Dela Cruz\",\"juan@example.com\",\"0917 123 4567\",\"12 Rizal St.\",\
             \"San Jose\",\"Tacloban\",\"Leyte\",\"Eastern Visayas\",\"Oct 18, 2026, 03:04 PM\""
        );
    }

    #[test]
    fn empty_export_is_just_the_header() {
        assert_eq!(to_csv(&[], &Utc), EXPORT_HEADERS.join(","));
    }

    #[test]
    fn missing_fields_render_not_available() {
        let csv = to_csv(&[user("b", json!({}))], &Utc);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, vec!["\"N/A\""; 9].join(","));
    }

    #[test]
    fn quotes_and_commas_are_escaped() {
        let tricky = user(
            "c",
            json!({"FirstName": "Ana \"Nene\"", "Address": "Purok 1, Zone 2\nBack lot"}),
        );
        let csv = to_csv(&[tricky], &Utc);
        assert!(csv.contains("\"Ana \"\"Nene\"\"\""));

        let rows = parse_csv(&csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "Ana \"Nene\"");
        assert_eq!(rows[1][3], "Purok 1, Zone 2\nBack lot");
    }

    #[test]
    fn every_exported_row_reads_back_as_its_derived_values() {
        let users = vec![
            juan(),
            user("b", json!({})),
            user(
                "c",
                json!({"FirstName": "Ana \"Nene\"", "Address": "Purok 1, Zone 2\nBack lot",
                       "City": "Palo, Leyte", "createdAt": "2026-02-03T04:05:06Z"}),
            ),
            user(
                "d",
                json!({"LastName": "Reyes", "Mobile_Number": "+63 918 555 0000",
                       "Email": "d@example.com", "Region": "\"VIII\""}),
            ),
        ];

        let rows = parse_csv(&to_csv(&users, &Utc)).unwrap();
        assert_eq!(rows.len(), users.len() + 1);
        assert_eq!(rows[0], EXPORT_HEADERS.to_vec());
        for (i, user) in users.iter().enumerate() {
            assert_eq!(rows[i + 1], export_row(user, &Utc).to_vec());
        }
        assert_eq!(rows[4][2], "+63 918 555 0000");
    }

    #[test]
    fn excel_variant_has_bom() {
        let users = [juan()];
        let excel = to_excel_csv(&users, &Utc);
        assert!(excel.starts_with('\u{FEFF}'));
        assert_eq!(&excel['\u{FEFF}'.len_utf8()..], to_csv(&users, &Utc));

        let rows = parse_csv(&excel).unwrap();
        assert_eq!(rows[0][0], "Name");
        assert_eq!(rows[1][6], "Leyte");
    }

    #[test]
    fn filenames() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(export_filename(ExportFormat::Csv, date), "tulong-users-2026-01-05.csv");
        assert_eq!(export_filename(ExportFormat::Xlsx, date), "tulong-users-2026-01-05.xlsx");
    }

    #[test]
    fn parse_csv_edge_cases() {
        assert!(parse_csv("").unwrap().is_empty());
        assert_eq!(parse_csv("a,,b").unwrap(), vec![vec!["a", "", "b"]]);
        assert_eq!(
            parse_csv("x,y\r\n1,2").unwrap(),
            vec![vec!["x", "y"], vec!["1", "2"]]
        );
        assert!(parse_csv("\"open,field").is_err());
    }

    #[cfg(feature = "web")]
    #[test]
    fn xlsx_is_a_zip_archive() {
        let bytes = to_xlsx(&[juan()], &Utc).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
