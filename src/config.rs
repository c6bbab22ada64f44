use crate::apportion::{Method, TARGET_RATIO};
use crate::types::CategoryFilter;
use crate::util::{parse_cutoff, parse_hex_color};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_CUTOFF: &str = "30/06/2025";
pub const DEFAULT_TOP_N: u32 = 44;
pub const DEFAULT_PENDING_COLOR: &str = "#e72914";
pub const DEFAULT_OK_COLOR: &str = "#0fe267";
pub const DEFAULT_UOR_PREFIX: &str = "8553";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// Round every Prefixo up on its own.
    Ceil,
    /// Hamilton allocation that keeps the rounded grand total.
    LargestRemainder,
}

impl From<MethodArg> for Method {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::Ceil => Method::Ceiling,
            MethodArg::LargestRemainder => Method::LargestRemainder,
        }
    }
}

/// EPS pending report: percentage of people who still need to take the
/// EPS before a cutoff date, per Prefixo.
#[derive(Debug, Parser)]
#[command(name = "eps_dashboard", version, about)]
pub struct Args {
    /// Headerless 14-column CSV to load at startup.
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Records dated before this day (DD/MM/YYYY) are pending.
    #[arg(long, default_value = DEFAULT_CUTOFF)]
    pub cutoff: String,

    /// How many Prefixos the bar chart shows.
    #[arg(long, default_value_t = DEFAULT_TOP_N, value_parser = clap::value_parser!(u32).range(1..=200))]
    pub top_n: u32,

    /// Donut color for people who must take the EPS.
    #[arg(long, default_value = DEFAULT_PENDING_COLOR)]
    pub pending_color: String,

    /// Donut color for everyone else.
    #[arg(long, default_value = DEFAULT_OK_COLOR)]
    pub ok_color: String,

    /// Prefixo to filter the KPIs by and highlight in the bar chart ("All", "NA" or a value).
    #[arg(long, default_value = "All")]
    pub filter: String,

    /// How the "missing for 90%" column is computed.
    #[arg(long, value_enum, default_value_t = MethodArg::Ceil)]
    pub method: MethodArg,

    /// Prefixo whose UORs are offered in the drill-down.
    #[arg(long, default_value = DEFAULT_UOR_PREFIX)]
    pub uor_prefix: String,

    /// Directory where charts and spreadsheets are written.
    #[arg(long, short = 'o', default_value = ".")]
    pub out_dir: PathBuf,

    /// Scale factor for chart images.
    #[arg(long, default_value_t = 2)]
    pub scale: u32,

    /// Run the whole report once and exit instead of showing the menu.
    #[arg(long)]
    pub batch: bool,

    /// When set, the interactive session asks for this password first.
    #[arg(long, env = "EPS_DASHBOARD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Validated settings, built once from [`Args`].
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub cutoff: NaiveDate,
    pub top_n: usize,
    pub pending_color: (u8, u8, u8),
    pub ok_color: (u8, u8, u8),
    pub filter: CategoryFilter,
    pub method: Method,
    pub target_ratio: f64,
    pub uor_prefix: String,
    pub out_dir: PathBuf,
    pub scale: u32,
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self> {
        let cutoff = parse_cutoff(&args.cutoff)
            .ok_or_else(|| anyhow!("invalid cutoff '{}', expected DD/MM/YYYY", args.cutoff))?;
        let color = |s: &str| parse_hex_color(s).ok_or_else(|| anyhow!("invalid color '{s}', expected #rrggbb"));
        if args.scale == 0 {
            return Err(anyhow!("scale must be at least 1"));
        }
        Ok(Settings {
            cutoff,
            top_n: args.top_n as usize,
            pending_color: color(&args.pending_color)?,
            ok_color: color(&args.ok_color)?,
            filter: CategoryFilter::parse(&args.filter),
            method: args.method.into(),
            target_ratio: TARGET_RATIO,
            uor_prefix: args.uor_prefix.trim().to_string(),
            out_dir: args.out_dir.clone(),
            scale: args.scale,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            cutoff: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap_or_default(),
            top_n: DEFAULT_TOP_N as usize,
            pending_color: (0xe7, 0x29, 0x14),
            ok_color: (0x0f, 0xe2, 0x67),
            filter: CategoryFilter::All,
            method: Method::Ceiling,
            target_ratio: TARGET_RATIO,
            uor_prefix: DEFAULT_UOR_PREFIX.to_string(),
            out_dir: PathBuf::from("."),
            scale: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CategoryKey;

    fn parse(argv: &[&str]) -> Result<Settings> {
        let mut full = vec!["eps_dashboard"];
        full.extend_from_slice(argv);
        let args = Args::try_parse_from(full)?;
        Settings::from_args(&args)
    }

    #[test]
    fn defaults_match_the_dashboard() {
        let s = parse(&[]).unwrap();
        assert_eq!(s, Settings { out_dir: PathBuf::from("."), ..Settings::default() });
    }

    #[test]
    fn overrides_are_applied() {
        let s = parse(&[
            "--cutoff", "31/12/2024",
            "--top-n", "5",
            "--pending-color", "#000000",
            "--filter", "9999",
            "--method", "largest-remainder",
        ])
        .unwrap();
        assert_eq!(s.cutoff, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(s.top_n, 5);
        assert_eq!(s.pending_color, (0, 0, 0));
        assert_eq!(s.filter, CategoryFilter::Only(CategoryKey::Value("9999".into())));
        assert_eq!(s.method, Method::LargestRemainder);
    }

    #[test]
    fn top_n_range_is_enforced() {
        assert!(Args::try_parse_from(["eps_dashboard", "--top-n", "0"]).is_err());
        assert!(Args::try_parse_from(["eps_dashboard", "--top-n", "201"]).is_err());
        assert!(Args::try_parse_from(["eps_dashboard", "--top-n", "200"]).is_ok());
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse(&["--cutoff", "2025-06-30"]).is_err());
        assert!(parse(&["--ok-color", "green"]).is_err());
        assert!(parse(&["--scale", "0"]).is_err());
    }
}
