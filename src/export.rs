//! Spreadsheet export of registrations.

use rust_xlsxwriter::{Format, Workbook};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::registration::{self, RegistrationWithEvent};

pub const SHEET_NAME: &str = "Registrations";
pub const HEADER: [&str; 9] = [
    "Event",
    "Team Name",
    "Team Lead",
    "Team Lead Email",
    "Team Lead Phone",
    "Team Lead Reg No",
    "Members",
    "Member Emails",
    "Registered At (UTC)",
];
const MEMBER_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// Unknown values fall back to xlsx.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("csv") => ExportFormat::Csv,
            _ => ExportFormat::Xlsx,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

/// Header plus one row of cells per registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn from_registrations(registrations: &[RegistrationWithEvent]) -> Self {
        let rows = registrations
            .iter()
            .map(|r| {
                let reg = &r.registration;
                let lead = &reg.team_lead;
                let names: Vec<&str> = reg.members.iter().map(|m| m.name.as_str()).collect();
                let emails: Vec<&str> = reg
                    .members
                    .iter()
                    .filter_map(|m| m.email.as_deref())
                    .collect();
                vec![
                    r.event_name.clone(),
                    reg.team_name.clone().unwrap_or_default(),
                    lead.name.clone(),
                    lead.email.clone(),
                    lead.phone.clone().unwrap_or_default(),
                    lead.reg_no.clone().unwrap_or_default(),
                    names.join(MEMBER_SEPARATOR),
                    emails.join(MEMBER_SEPARATOR),
                    reg.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                ]
            })
            .collect();
        Self {
            header: HEADER.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    pub fn to_xlsx(&self) -> Result<Vec<u8>, AppError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, title) in self.header.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, title, &bold)?;
        }
        for (i, row) in self.rows.iter().enumerate() {
            let r = u32::try_from(i + 1).map_err(|_| AppError::Export("too many rows".to_string()))?;
            for (col, value) in row.iter().enumerate() {
                sheet.write_string(r, col as u16, value)?;
            }
        }
        sheet.autofit();

        Ok(workbook.save_to_buffer()?)
    }

    /// RFC 4180 CSV. Cells a spreadsheet would read as a formula get a
    /// leading `'`.
    pub fn to_csv(&self) -> String {
        fn escape_csv(s: &str) -> String {
            let s = if s.starts_with(['=', '+', '-', '@', '\t', '\r']) {
                format!("'{s}")
            } else {
                s.to_string()
            };
            if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
                format!("\"{}\"", s.replace('"', "\"\""))
            } else {
                s
            }
        }

        let mut out = String::new();
        for line in std::iter::once(&self.header).chain(self.rows.iter()) {
            let cells: Vec<String> = line.iter().map(|c| escape_csv(c)).collect();
            out.push_str(&cells.join(","));
            out.push_str("\r\n");
        }
        out
    }
}

/// A rendered export ready to send as a download.
pub struct ExportFile {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    pub row_count: usize,
}

/// Read registrations (optionally one event's) and render them.
pub async fn export(pool: &PgPool, event_id: Option<i64>, format: ExportFormat) -> Result<ExportFile, AppError> {
    let registrations = registration::list_for_export(pool, event_id).await?;
    let table = ExportTable::from_registrations(&registrations);
    let bytes = match format {
        ExportFormat::Xlsx => table.to_xlsx()?,
        ExportFormat::Csv => table.to_csv().into_bytes(),
    };
    log::info!(
        "Exported {} registrations as {} (event filter: {event_id:?})",
        table.rows.len(),
        format.extension()
    );
    Ok(ExportFile { format, bytes, row_count: table.rows.len() })
}
