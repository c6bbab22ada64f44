use crate::error::LoadError;
use crate::types::{RawRow, Record, CATEGORY_COLUMN, COLUMNS};
use crate::util::{clean_text, parse_date_dayfirst, parse_f64_safe};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;
use tracing::{debug, info};

const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Rows with fewer than 14 fields, padded with missing values.
    pub short_rows: usize,
    /// Non-empty date fields that did not parse.
    pub unparsed_dates: usize,
    pub missing_dates: usize,
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<(Vec<Record>, LoadReport), LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    info!(path = %path.display(), bytes = bytes.len(), "reading CSV");
    load_from_bytes(&bytes)
}

/// Parse a headerless, comma-separated, 14-column file held in memory.
///
/// The first line is data. Short lines are padded with missing values; a
/// line with more than 14 fields fails the whole load.
pub fn load_from_bytes(bytes: &[u8]) -> Result<(Vec<Record>, LoadReport), LoadError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let mut report = LoadReport::default();
    let mut widest = 0usize;
    let mut records: Vec<Record> = Vec::new();
    let mut raw = StringRecord::new();

    loop {
        match rdr.read_record(&mut raw) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                return Err(LoadError::Malformed { line, message: e.to_string() });
            }
        }
        let line = raw.position().map_or(0, |p| p.line());
        report.total_rows += 1;
        widest = widest.max(raw.len());

        if raw.len() > COLUMNS.len() {
            return Err(LoadError::TooManyFields { line, found: raw.len(), expected: COLUMNS.len() });
        }
        if raw.len() < COLUMNS.len() {
            report.short_rows += 1;
            while raw.len() < COLUMNS.len() {
                raw.push_field("");
            }
        }

        let row: RawRow = raw
            .deserialize(None)
            .map_err(|e| LoadError::Malformed { line, message: e.to_string() })?;
        let record = clean(row, &mut report);
        if record.last_compliance_date.is_none() {
            report.missing_dates += 1;
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(LoadError::Empty);
    }
    if widest <= CATEGORY_COLUMN {
        return Err(LoadError::MissingColumn(COLUMNS[CATEGORY_COLUMN]));
    }

    info!(
        rows = report.total_rows,
        short_rows = report.short_rows,
        missing_dates = report.missing_dates,
        "dataset loaded"
    );
    Ok((records, report))
}

fn clean(row: RawRow, report: &mut LoadReport) -> Record {
    let raw_date = clean_text(row.data_ultimo_eps);
    let last_compliance_date = parse_date_dayfirst(raw_date.as_deref());
    if let (Some(text), None) = (&raw_date, last_compliance_date) {
        debug!(value = %text, "unparseable date treated as missing");
        report.unparsed_dates += 1;
    }

    Record {
        id: clean_text(row.matricula),
        name: clean_text(row.nome_funcionario),
        evaluable_flag: clean_text(row.avaliavel),
        last_compliance_date,
        compliance_status: clean_text(row.situacao_eps),
        days_to_due: parse_f64_safe(row.dias_para_vencimento.as_deref()),
        status_indicator: clean_text(row.status_indicador),
        role: clean_text(row.cargo),
        category: clean_text(row.prefixo),
        department: clean_text(row.dependencia),
        org_unit_code: clean_text(row.codigo_uor),
        org_unit: clean_text(row.uor),
        secondary_category: clean_text(row.prefixo_ajure),
        secondary_org: clean_text(row.ajure),
    }
}
