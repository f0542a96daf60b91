//! Printable HTML report of the user list.

use chrono::{DateTime, TimeZone};
use handlebars::Handlebars;
use serde::Serialize;
use std::error::Error;
use std::fmt;

use crate::user::UserRecord;

pub const REPORT_TITLE: &str = "T.U.L.O.N.G Users Report";

/// Format of the "Generated" line, e.g. `10/18/2026, 3:04:05 PM`.
pub const GENERATED_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

const TEMPLATE_NAME: &str = "report";

#[derive(Serialize)]
struct ReportRow {
    name: String,
    email: String,
    phone: String,
    city: String,
    province: String,
    region: String,
    created: String,
}

#[derive(Serialize)]
struct ReportData {
    title: &'static str,
    generated: String,
    total: usize,
    rows: Vec<ReportRow>,
}

/// Render the report for `users`, with dates shown in `generated_at`'s zone.
///
/// Every value is HTML-escaped, so user-entered markup is shown as text.
///
/// # Returns
/// * `Result<String, Box<dyn Error>>` - The complete HTML document or an error
pub fn render_report<Tz>(
    users: &[UserRecord],
    generated_at: &DateTime<Tz>,
) -> Result<String, Box<dyn Error>>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let tz = generated_at.timezone();
    let rows = users
        .iter()
        .map(|user| ReportRow {
            name: user.full_name(),
            email: user.email().to_string(),
            phone: user.phone_number().to_string(),
            city: user.city().to_string(),
            province: user.province().to_string(),
            region: user.region().to_string(),
            created: user.created_display(&tz),
        })
        .collect();

    let data = ReportData {
        title: REPORT_TITLE,
        generated: generated_at.format(GENERATED_FORMAT).to_string(),
        total: users.len(),
        rows,
    };

    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_template_string(TEMPLATE_NAME, include_str!("./static/report.hbs"))?;

    Ok(registry.render(TEMPLATE_NAME, &data)?)
}
