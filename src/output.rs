// Exports and console previews.
//
// Every export is built in memory first (`*_workbook`, `pending_csv`) and
// only then written with `write_bytes`, so a failing export never leaves
// a half-written file behind and the shell can report it on its own.
use crate::reports::pending_by_category;
use crate::types::{Cell, Record, COLUMNS, INTERNAL_STATUS_COLUMNS};
use crate::util::{format_date, sanitize_filename, sanitize_sheet_title, DEFAULT_SHEET_NAME, SHEET_NAME_MAX};
use anyhow::{anyhow, Context, Result};
use chrono::Datelike;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const PENDING_XLSX: &str = "dados_pendentes.xlsx";
pub const PER_CATEGORY_XLSX: &str = "dados_pendentes_por_prefixo.xlsx";
pub const PENDING_CSV: &str = "dados_pendentes.csv";
pub const SUMMARY_JSON: &str = "summary.json";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const DATE_FORMAT: &str = "dd/mm/yyyy";

/// Column indexes written to the per-Prefixo workbook.
pub fn export_columns() -> Vec<usize> {
    (0..COLUMNS.len())
        .filter(|c| !INTERNAL_STATUS_COLUMNS.contains(c))
        .collect()
}

fn all_columns() -> Vec<usize> {
    (0..COLUMNS.len()).collect()
}

fn write_sheet(ws: &mut Worksheet, records: &[&Record], columns: &[usize]) -> Result<()> {
    let header = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    for (c, &col) in columns.iter().enumerate() {
        ws.write_string_with_format(0, c as u16, COLUMNS[col], &header)?;
    }
    for (r, record) in records.iter().enumerate() {
        let row = r as u32 + 1;
        for (c, &col) in columns.iter().enumerate() {
            let c = c as u16;
            match record.cell(col) {
                Cell::Text(s) => {
                    ws.write_string(row, c, s)?;
                }
                Cell::Number(n) => {
                    ws.write_number(row, c, n)?;
                }
                // Excel cannot represent dates before 1900; keep those as text.
                Cell::Date(d) => match ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8) {
                    Ok(dt) => {
                        ws.write_datetime_with_format(row, c, &dt, &date_format)?;
                    }
                    Err(_) => {
                        ws.write_string(row, c, format_date(d))?;
                    }
                },
                Cell::Missing => {}
            }
        }
    }
    ws.autofit();
    Ok(())
}

/// Single sheet "Pendentes" with every pending record and all 14 columns.
pub fn pending_workbook(pending: &[&Record]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name(DEFAULT_SHEET_NAME)?;
    write_sheet(ws, pending, &all_columns())?;
    Ok(workbook.save_to_buffer()?)
}

/// Sanitized sheet name, made unique within one workbook. Excel compares
/// sheet names case-insensitively.
fn unique_sheet_name(raw: &str, used: &mut HashSet<String>) -> String {
    let base = sanitize_sheet_title(raw);
    let mut name = base.clone();
    let mut n = 2;
    while !used.insert(name.to_lowercase()) {
        let suffix = format!(" ({n})");
        let keep = SHEET_NAME_MAX - suffix.chars().count();
        name = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    name
}

/// One sheet per Prefixo (pending records only), without the two internal
/// status columns. Records without a Prefixo go to a sheet named "NA".
pub fn per_category_workbook(pending: &[&Record]) -> Result<Vec<u8>> {
    let columns = export_columns();
    let mut workbook = Workbook::new();
    let groups = pending_by_category(pending);
    if groups.is_empty() {
        let ws = workbook.add_worksheet();
        ws.set_name(DEFAULT_SHEET_NAME)?;
        write_sheet(ws, &[], &columns)?;
    }

    let mut used = HashSet::new();
    for (key, records) in &groups {
        let name = unique_sheet_name(&key.to_string(), &mut used);
        let ws = workbook.add_worksheet();
        ws.set_name(&name).with_context(|| format!("naming sheet for Prefixo {key}"))?;
        write_sheet(ws, records, &columns)?;
    }
    Ok(workbook.save_to_buffer()?)
}

/// Pending records of one UOR, on a sheet named after it.
pub fn unit_workbook(records: &[&Record], unit: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name(sanitize_sheet_title(unit))?;
    write_sheet(ws, records, &all_columns())?;
    Ok(workbook.save_to_buffer()?)
}

pub fn unit_filename(unit: &str) -> String {
    format!("{} Pendentes.xlsx", sanitize_filename(unit))
}

/// `name`, or `name` with ` (n)` before the extension when an earlier
/// export in the same run already took it.
pub fn unique_file_name(name: &str, used: &mut HashSet<String>) -> String {
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    let ext = path.extension().and_then(|e| e.to_str());
    let mut candidate = name.to_string();
    let mut n = 2;
    while !used.insert(candidate.to_lowercase()) {
        candidate = match ext {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        n += 1;
    }
    candidate
}

fn csv_field(cell: Cell<'_>) -> String {
    match cell {
        Cell::Text(s) => s.to_string(),
        Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{n:.0}"),
        Cell::Number(n) => n.to_string(),
        Cell::Date(d) => format_date(d),
        Cell::Missing => String::new(),
    }
}

/// Pending records as UTF-8 CSV with a BOM and a header row, so the file
/// opens with the right encoding in Excel.
pub fn pending_csv(pending: &[&Record]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(UTF8_BOM.to_vec());
    wtr.write_record(COLUMNS)?;
    for r in pending {
        wtr.write_record((0..COLUMNS.len()).map(|c| csv_field(r.cell(c))))?;
    }
    wtr.flush()?;
    wtr.into_inner().map_err(|e| anyhow!("flushing CSV buffer: {}", e.error()))
}

/// Content type for an export, by file extension.
pub fn mime_for(name: &str) -> &'static str {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some("xlsx") => XLSX_MIME,
        Some("csv") => "text/csv",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

pub fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), mime = mime_for(name), "export written");
    Ok(path)
}

pub fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let s = serde_json::to_string_pretty(value)?;
    write_bytes(dir, name, s.as_bytes())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    preview_table_rows(rows, max_rows);
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
    if rows.len() > max_rows {
        println!("... {} more rows\n", rows.len() - max_rows);
    }
}
