use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Column names in file order. The CSV has no header row; these are
/// assigned positionally and reused as spreadsheet headers.
pub const COLUMNS: [&str; 14] = [
    "Matricula",
    "Nome_Funcionario",
    "Avaliavel",
    "Data_Ultimo_Eps",
    "Situacao_Eps",
    "Dias_Para_Vencimento",
    "Status_Indicador",
    "Cargo",
    "Prefixo",
    "Dependencia",
    "Codigo_Uor",
    "Uor",
    "Prefixo_Ajure",
    "Ajure",
];

pub const DATE_COLUMN: usize = 3;
pub const DAYS_COLUMN: usize = 5;
pub const CATEGORY_COLUMN: usize = 8;

/// Situacao_Eps and Status_Indicador, left out of the per-Prefixo workbook.
pub const INTERNAL_STATUS_COLUMNS: [usize; 2] = [4, 6];

/// One CSV line, deserialized by position.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    pub matricula: Option<String>,
    pub nome_funcionario: Option<String>,
    pub avaliavel: Option<String>,
    pub data_ultimo_eps: Option<String>,
    pub situacao_eps: Option<String>,
    pub dias_para_vencimento: Option<String>,
    pub status_indicador: Option<String>,
    pub cargo: Option<String>,
    pub prefixo: Option<String>,
    pub dependencia: Option<String>,
    pub codigo_uor: Option<String>,
    pub uor: Option<String>,
    pub prefixo_ajure: Option<String>,
    pub ajure: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Option<String>,
    pub name: Option<String>,
    pub evaluable_flag: Option<String>,
    pub last_compliance_date: Option<NaiveDate>,
    pub compliance_status: Option<String>,
    pub days_to_due: Option<f64>,
    pub status_indicator: Option<String>,
    pub role: Option<String>,
    pub category: Option<String>,
    pub department: Option<String>,
    pub org_unit_code: Option<String>,
    pub org_unit: Option<String>,
    pub secondary_category: Option<String>,
    pub secondary_org: Option<String>,
}

/// A single typed value, addressed by column index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Date(NaiveDate),
    Missing,
}

fn text(v: &Option<String>) -> Cell<'_> {
    v.as_deref().map_or(Cell::Missing, Cell::Text)
}

impl Record {
    pub fn cell(&self, column: usize) -> Cell<'_> {
        match column {
            0 => text(&self.id),
            1 => text(&self.name),
            2 => text(&self.evaluable_flag),
            DATE_COLUMN => self.last_compliance_date.map_or(Cell::Missing, Cell::Date),
            4 => text(&self.compliance_status),
            DAYS_COLUMN => self.days_to_due.map_or(Cell::Missing, Cell::Number),
            6 => text(&self.status_indicator),
            7 => text(&self.role),
            CATEGORY_COLUMN => text(&self.category),
            9 => text(&self.department),
            10 => text(&self.org_unit_code),
            11 => text(&self.org_unit),
            12 => text(&self.secondary_category),
            13 => text(&self.secondary_org),
            _ => Cell::Missing,
        }
    }

    pub fn category_key(&self) -> CategoryKey {
        match &self.category {
            Some(v) => CategoryKey::Value(v.clone()),
            None => CategoryKey::Missing,
        }
    }
}

/// Grouping key for Prefixo. Present values order by text and the missing
/// bucket comes last; every per-category table follows this order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoryKey {
    Value(String),
    Missing,
}

impl CategoryKey {
    pub fn matches(&self, category: Option<&str>) -> bool {
        match (self, category) {
            (Self::Value(v), Some(c)) => v == c,
            (Self::Missing, None) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.write_str(v),
            Self::Missing => f.write_str("NA"),
        }
    }
}

/// Which slice of the dataset the KPIs and donut describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(CategoryKey),
}

impl CategoryFilter {
    /// "All" (or the Portuguese "Todos") selects everything, "NA" the records
    /// without a Prefixo, anything else that exact Prefixo.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "All" | "Todos" => Self::All,
            "NA" => Self::Only(CategoryKey::Missing),
            v => Self::Only(CategoryKey::Value(v.to_string())),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Only(key) => key.matches(record.category.as_deref()),
        }
    }

    pub fn pinned(&self) -> Option<&CategoryKey> {
        match self {
            Self::All => None,
            Self::Only(key) => Some(key),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Only(key) => write!(f, "{key}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAggregate {
    pub key: CategoryKey,
    pub total: usize,
    pub pending: usize,
    /// Percentage in `0..=100`.
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApportionmentRow {
    pub key: CategoryKey,
    pub total: usize,
    pub pending: usize,
    pub ratio: f64,
    pub target_count: usize,
    pub shortfall: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kpis {
    pub ratio: f64,
    pub total: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    pub label: String,
    pub filter: CategoryFilter,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CategoryTableRow {
    #[serde(rename = "Prefixo")]
    #[tabled(rename = "Prefixo")]
    pub prefixo: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: usize,
    #[serde(rename = "Pendentes")]
    #[tabled(rename = "Pendentes")]
    pub pending: usize,
    #[serde(rename = "Porcentagem (%)")]
    #[tabled(rename = "Porcentagem (%)")]
    pub ratio: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ApportionmentTableRow {
    #[serde(rename = "Prefixo")]
    #[tabled(rename = "Prefixo")]
    pub prefixo: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: usize,
    #[serde(rename = "Pendentes")]
    #[tabled(rename = "Pendentes")]
    pub pending: usize,
    #[serde(rename = "%Pendentes")]
    #[tabled(rename = "%Pendentes")]
    pub ratio: String,
    #[serde(rename = "Meta_90%_Qtd")]
    #[tabled(rename = "Meta_90%_Qtd")]
    pub target_count: usize,
    #[serde(rename = "Faltam para 90%")]
    #[tabled(rename = "Faltam para 90%")]
    pub shortfall: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PreviewRow {
    #[tabled(rename = "Matricula")]
    pub id: String,
    #[tabled(rename = "Nome_Funcionario")]
    pub name: String,
    #[tabled(rename = "Data_Ultimo_Eps")]
    pub last_compliance_date: String,
    #[tabled(rename = "Prefixo")]
    pub prefixo: String,
    #[tabled(rename = "Dependencia")]
    pub department: String,
    #[tabled(rename = "Uor")]
    pub org_unit: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub cutoff: String,
    pub filter: String,
    pub total_records: usize,
    pub pending_records: usize,
    pub pending_pct: f64,
    pub categories: usize,
    pub method: String,
    pub total_shortfall: usize,
    pub final_pending_pct: f64,
}
