// Entry point and high-level CLI flow.
//
// Two ways to run:
// - `--batch` loads `--input`, writes every chart, spreadsheet and the JSON
//   summary into `--out-dir`, and exits.
// - Otherwise an interactive menu mirrors the dashboard: load a file, read
//   the KPIs, pick a Prefixo, look at the per-Prefixo table and the 90%
//   target, drill into the UORs of one Prefixo, and export.
//
// Everything is recomputed from the loaded records on each action; the
// only state kept between actions lives in `Session`.
mod apportion;
mod charts;
mod config;
mod error;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use anyhow::{bail, Context, Result};
use apportion::{apportion, apportionment_table, validate};
use clap::Parser;
use config::{Args, Settings};
use reports::{
    category_options, category_table, filter_kpis, org_units_for, pending_for_unit, preview_rows,
    Snapshot,
};
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use types::{Record, SummaryStats};
use util::{format_date, format_int, format_pct, parse_cutoff};

const MAX_LOGIN_TRIES: u32 = 5;

/// Per-run state: validated settings, the loaded dataset and the
/// password gate.
struct Session {
    settings: Settings,
    password: Option<String>,
    data: Option<Vec<Record>>,
    source: Option<PathBuf>,
    auth_ok: bool,
    login_tries: u32,
}

#[derive(Debug, PartialEq, Eq)]
enum Gate {
    Granted,
    Blank,
    Wrong { message: String, hint: bool },
    Locked,
}

impl Session {
    fn new(settings: Settings, password: Option<String>) -> Self {
        let password = password.filter(|p| !p.is_empty());
        Session {
            settings,
            auth_ok: password.is_none(),
            password,
            data: None,
            source: None,
            login_tries: 0,
        }
    }

    /// One login attempt. The first miss gets a plain message, the next
    /// ones show the attempt count and a hint, the fifth locks the session.
    fn try_login(&mut self, attempt: &str) -> Gate {
        let Some(expected) = self.password.as_deref() else {
            self.auth_ok = true;
            return Gate::Granted;
        };
        if self.login_tries >= MAX_LOGIN_TRIES {
            return Gate::Locked;
        }
        if attempt.is_empty() {
            return Gate::Blank;
        }
        if attempt == expected {
            self.auth_ok = true;
            self.login_tries = 0;
            return Gate::Granted;
        }
        self.login_tries += 1;
        match self.login_tries {
            1 => Gate::Wrong { message: "Wrong password. Try again.".into(), hint: false },
            n if n < MAX_LOGIN_TRIES => Gate::Wrong {
                message: format!("Wrong password. Attempts: {n}/{MAX_LOGIN_TRIES}."),
                hint: true,
            },
            _ => Gate::Locked,
        }
    }

    fn data(&self) -> Result<&[Record]> {
        match &self.data {
            Some(d) => Ok(d.as_slice()),
            None => bail!("no data loaded. Please load the CSV file first (option 1)"),
        }
    }
}

fn init_tracing() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    prompt("Enter choice: ")
}

fn prompt(label: &str) -> String {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask whether to go back to the menu. `true` for `Y`, `false` for `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to the menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Returns `false` when the session got locked.
fn run_gate(session: &mut Session) -> bool {
    if session.auth_ok {
        return true;
    }
    println!("Restricted access");
    loop {
        let attempt = prompt("Password: ");
        match session.try_login(&attempt) {
            Gate::Granted => {
                println!("Access granted. Loading the dashboard...\n");
                info!("session unlocked");
                return true;
            }
            Gate::Blank => println!("Type the password to continue."),
            Gate::Wrong { message, hint } => {
                println!("{message}");
                if hint {
                    println!("Hint: check upper/lower case or paste the password carefully.");
                }
            }
            Gate::Locked => {
                println!("Too many failed attempts. Wait a moment and try again.");
                println!("If the problem persists, contact the dashboard owner.");
                warn!(tries = session.login_tries, "session locked");
                return false;
            }
        }
    }
}

fn load_into(session: &mut Session, path: &Path) -> Result<()> {
    let (data, report) = loader::load_from_path(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    println!(
        "Processing dataset... ({} rows loaded)",
        format_int(report.total_rows)
    );
    if report.short_rows > 0 {
        println!("Note: {} short rows padded with blanks.", format_int(report.short_rows));
    }
    if report.unparsed_dates > 0 {
        println!(
            "Note: {} dates could not be read and count as missing.",
            format_int(report.unparsed_dates)
        );
    }
    println!();
    output::preview_table("Preview", None, &preview_rows(&data, 5), 5);
    session.data = Some(data);
    session.source = Some(path.to_path_buf());
    Ok(())
}

/// Option [1]: load (or reload) the CSV.
fn handle_load(session: &mut Session) -> Result<()> {
    let default = session.source.clone();
    let label = match &default {
        Some(p) => format!("CSV path [{}]: ", p.display()),
        None => "CSV path: ".to_string(),
    };
    let answer = prompt(&label);
    let path = match (answer.is_empty(), default) {
        (false, _) => PathBuf::from(answer),
        (true, Some(p)) => p,
        (true, None) => bail!("no path given"),
    };
    load_into(session, &path)
}

/// Option [2]: KPI cards and the donut chart.
fn handle_overview(session: &Session) -> Result<()> {
    let data = session.data()?;
    let s = &session.settings;
    let snap = Snapshot::build(data, s.cutoff);
    let kpis = filter_kpis(data, &snap.pending, &s.filter);

    println!("Overview (Prefixo: {}, cutoff {})\n", s.filter, format_date(s.cutoff));
    println!("Total records - {}: {}", s.filter, format_int(kpis.total));
    println!("People who must take the EPS by {}: {}", format_date(s.cutoff), format_int(kpis.pending));
    println!("Pending share: {}\n", format_pct(kpis.ratio, 1));

    report_exports(&write_jobs(&s.out_dir, donut_files(s, data, &snap)));
    Ok(())
}

/// Option [3]: choose the Prefixo used for the KPIs and the bar highlight.
fn handle_filter(session: &mut Session) -> Result<()> {
    let options = category_options(session.data()?);
    for (i, opt) in options.iter().enumerate() {
        println!("[{i}] {}", opt.label);
    }
    let choice = read_choice();
    let picked = match choice.parse::<usize>() {
        Ok(i) => options.get(i).map(|o| o.filter.clone()),
        Err(_) => Some(reports::filter_from_label(&choice)),
    };
    let Some(filter) = picked else {
        bail!("no option {choice}");
    };
    println!("Filter set to {filter}.\n");
    info!(filter = %filter, "filter changed");
    session.settings.filter = filter;
    Ok(())
}

/// Option [4]: per-Prefixo table and the bar chart.
fn handle_categories(session: &Session) -> Result<()> {
    let data = session.data()?;
    let s = &session.settings;
    let snap = Snapshot::build(data, s.cutoff);
    output::preview_table(
        "Pending share by Prefixo",
        Some(&format!("cutoff {}", format_date(s.cutoff))),
        &category_table(&snap.aggregates),
        usize::MAX,
    );
    println!("Bar chart with the top {} Prefixos:", s.top_n);
    report_exports(&write_jobs(&s.out_dir, bar_files(s, &snap)));
    Ok(())
}

/// Option [5]: how many more pending records each Prefixo needs for 90%.
fn handle_target(session: &mut Session) -> Result<()> {
    loop {
        let data = session.data()?;
        let s = &session.settings;
        let snap = Snapshot::build(data, s.cutoff);
        let rows = apportion(&snap.aggregates, s.target_ratio, s.method);
        output::preview_table(
            "Target: 90% pending per Prefixo",
            Some(&format!("method: {}", s.method)),
            &apportionment_table(&rows),
            usize::MAX,
        );

        let v = validate(&rows);
        println!("Validation");
        println!("Total records: {}", format_int(v.total));
        println!("Pending now: {}", format_int(v.pending));
        println!("Missing for 90%: {}", format_int(v.shortfall));
        println!("Pending after: {} ({})\n", format_int(v.final_pending), format_pct(v.final_pct, 2));

        let other = s.method.toggled();
        match prompt(&format!("[T] Switch to {other}  [Enter] Back: ")).to_uppercase().as_str() {
            "T" => session.settings.method = other,
            _ => return Ok(()),
        }
    }
}

/// Option [6]: pending records of one UOR of the configured Prefixo.
fn handle_units(session: &Session) -> Result<()> {
    let data = session.data()?;
    let s = &session.settings;
    let units = org_units_for(data, &s.uor_prefix);
    if units.is_empty() {
        bail!("no records with Prefixo {}", s.uor_prefix);
    }
    for (i, unit) in units.iter().enumerate() {
        println!("[{i}] {unit}");
    }
    let choice = read_choice();
    let unit = choice
        .parse::<usize>()
        .ok()
        .and_then(|i| units.get(i))
        .with_context(|| format!("no UOR {choice}"))?;

    let snap = Snapshot::build(data, s.cutoff);
    let records = pending_for_unit(&snap.pending, &s.uor_prefix, unit);
    println!("Prefixo: {}  UOR: {}  Pending: {}\n", s.uor_prefix, unit, format_int(records.len()));
    let owned: Vec<Record> = records.iter().map(|r| (*r).clone()).collect();
    output::preview_table_rows(&preview_rows(&owned, usize::MAX), 20);

    let bytes = output::unit_workbook(&records, unit)?;
    let path = output::write_bytes(&s.out_dir, &output::unit_filename(unit), &bytes)?;
    println!("(Exported to {})\n", path.display());
    Ok(())
}

/// Option [7]: write every export, reporting failures one by one.
fn handle_exports(session: &Session) -> Result<()> {
    let outcomes = export_all(&session.settings, session.data()?);
    report_exports(&outcomes);
    Ok(())
}

/// Option [8]: change the cutoff date or the number of bars.
fn handle_settings(session: &mut Session) -> Result<()> {
    let s = &mut session.settings;
    let answer = prompt(&format!("Cutoff DD/MM/YYYY [{}]: ", format_date(s.cutoff)));
    if !answer.is_empty() {
        s.cutoff = parse_cutoff(&answer).with_context(|| format!("invalid date '{answer}'"))?;
    }
    let answer = prompt(&format!("Prefixos in the bar chart (1-200) [{}]: ", s.top_n));
    if !answer.is_empty() {
        match answer.parse::<usize>() {
            Ok(n) if (1..=200).contains(&n) => s.top_n = n,
            _ => bail!("'{answer}' is not a number between 1 and 200"),
        }
    }
    println!("Cutoff {}, top {} Prefixos.\n", format_date(s.cutoff), s.top_n);
    Ok(())
}

type Job = (String, Result<Vec<u8>>);

/// Donut as PNG and SVG.
fn donut_files(s: &Settings, data: &[Record], snap: &Snapshot<'_>) -> Vec<Job> {
    let kpis = filter_kpis(data, &snap.pending, &s.filter);
    let chart = charts::donut_chart(kpis.ratio, &s.filter, snap.cutoff, s.pending_color, s.ok_color);
    vec![
        (charts::DONUT_PNG.to_string(), charts::render_donut_png(&chart, s.scale)),
        (charts::DONUT_SVG.to_string(), charts::render_donut_svg(&chart, s.scale).map(String::into_bytes)),
    ]
}

fn bar_files(s: &Settings, snap: &Snapshot<'_>) -> Vec<Job> {
    let bars = charts::select_bars(&snap.aggregates, s.top_n, s.filter.pinned(), true);
    vec![
        (charts::BARS_PNG.to_string(), charts::render_bar_png(&bars, s.scale)),
        (charts::BARS_SVG.to_string(), charts::render_bar_svg(&bars, s.scale).map(String::into_bytes)),
    ]
}

/// Write each job that built, keeping its own outcome.
fn write_jobs(dir: &Path, jobs: Vec<Job>) -> Vec<(String, Result<PathBuf>)> {
    jobs.into_iter()
        .map(|(name, bytes)| {
            let written = bytes.and_then(|b| output::write_bytes(dir, &name, &b));
            (name, written)
        })
        .collect()
}

fn build_summary(s: &Settings, data: &[Record]) -> SummaryStats {
    let snap = Snapshot::build(data, s.cutoff);
    let kpis = filter_kpis(data, &snap.pending, &s.filter);
    let v = validate(&apportion(&snap.aggregates, s.target_ratio, s.method));
    SummaryStats {
        cutoff: format_date(s.cutoff),
        filter: s.filter.to_string(),
        total_records: kpis.total,
        pending_records: kpis.pending,
        pending_pct: kpis.ratio,
        categories: snap.aggregates.len(),
        method: s.method.to_string(),
        total_shortfall: v.shortfall,
        final_pending_pct: v.final_pct,
    }
}

/// Build and write every artifact. One failing export does not stop the
/// others.
fn export_all(s: &Settings, data: &[Record]) -> Vec<(String, Result<PathBuf>)> {
    let snap = Snapshot::build(data, s.cutoff);
    let mut jobs = donut_files(s, data, &snap);
    jobs.extend(bar_files(s, &snap));
    jobs.extend([
        (output::PENDING_XLSX.to_string(), output::pending_workbook(&snap.pending)),
        (output::PER_CATEGORY_XLSX.to_string(), output::per_category_workbook(&snap.pending)),
        (output::PENDING_CSV.to_string(), output::pending_csv(&snap.pending)),
    ]);
    for unit in org_units_for(data, &s.uor_prefix) {
        let records = pending_for_unit(&snap.pending, &s.uor_prefix, &unit);
        if !records.is_empty() {
            jobs.push((output::unit_filename(&unit), output::unit_workbook(&records, &unit)));
        }
    }

    // UORs such as "A/B" and "A_B" sanitize to the same file name.
    let mut used = HashSet::from([output::SUMMARY_JSON.to_string()]);
    let jobs = jobs
        .into_iter()
        .map(|(name, bytes)| (output::unique_file_name(&name, &mut used), bytes))
        .collect();
    let mut outcomes = write_jobs(&s.out_dir, jobs);

    let summary = build_summary(s, data);
    outcomes.push((
        output::SUMMARY_JSON.to_string(),
        output::write_json(&s.out_dir, output::SUMMARY_JSON, &summary),
    ));
    outcomes
}

fn report_exports(outcomes: &[(String, Result<PathBuf>)]) {
    for (name, outcome) in outcomes {
        match outcome {
            Ok(path) => println!("Saved {}", path.display()),
            Err(e) => {
                let msg = format!("{e:#}");
                error!(export = %name, error = %msg, "export failed");
                eprintln!("Could not export {name}: {msg}");
            }
        }
    }
    println!();
}

fn run_batch(session: &mut Session) -> Result<()> {
    let Some(path) = session.source.clone() else {
        bail!("--batch needs --input <FILE>");
    };
    load_into(session, &path)?;
    let s = &session.settings;
    let data = session.data()?;

    let summary = build_summary(s, data);
    println!(
        "Pending by {}: {} of {} ({})\n",
        summary.cutoff,
        format_int(summary.pending_records),
        format_int(summary.total_records),
        format_pct(summary.pending_pct, 1)
    );
    let outcomes = export_all(s, data);
    report_exports(&outcomes);
    let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        bail!("{failed} of {} exports failed", outcomes.len());
    }
    Ok(())
}

fn run_menu(session: &mut Session) {
    if !run_gate(session) {
        return;
    }
    if let Some(path) = session.source.clone() {
        if let Err(e) = load_into(session, &path) {
            eprintln!("Error: {e:#}\n");
        }
    }

    loop {
        println!("EPS pending report");
        println!("[1] Load the file");
        println!("[2] Overview");
        println!("[3] Filter by Prefixo");
        println!("[4] Prefixo table and bar chart");
        println!("[5] 90% target");
        println!("[6] UOR drill-down ({})", session.settings.uor_prefix);
        println!("[7] Export everything");
        println!("[8] Cutoff and chart size");
        println!("[0] Exit\n");

        let result = match read_choice().as_str() {
            "1" => handle_load(session),
            "2" => handle_overview(session),
            "3" => handle_filter(session),
            "4" => handle_categories(session),
            "5" => handle_target(session),
            "6" => handle_units(session),
            "7" => handle_exports(session),
            "8" => handle_settings(session),
            "0" => {
                println!("Exiting the program.");
                return;
            }
            _ => {
                println!("Invalid choice. Please enter a number from 0 to 8.\n");
                continue;
            }
        };
        if let Err(e) = result {
            let msg = format!("{e:#}");
            warn!(error = %msg, "action failed");
            eprintln!("Error: {msg}\n");
        }
        if !prompt_back_to_menu() {
            println!("Exiting the program.");
            return;
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = Settings::from_args(&args)?;
    info!(cutoff = %format_date(settings.cutoff), batch = args.batch, "startup");

    let mut session = Session::new(settings, args.password.clone());
    session.source = args.input.clone();

    if args.batch {
        return run_batch(&mut session);
    }
    run_menu(&mut session);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
1001,Ana,S,15/01/2025,Vencido,-10,Vermelho,Caixa,8553,GEREL,77,UOR Centro,12,Ajure Sul
1002,Bruno,S,02/03/2024,Vencido,,Vermelho,Gerente,8553,GEREL,78,UOR Norte,12,Ajure Sul
1003,Carla,N,10/08/2025,Em dia,40,Verde,Caixa,9999,AG,,,,
1004,Davi,S,31/02/2025,Vencido,3,Amarelo,Caixa,9999,AG,,,,
";

    fn locked_session() -> Session {
        Session::new(Settings::default(), Some("s3cret".into()))
    }

    #[test]
    fn no_password_means_open_session() {
        let mut s = Session::new(Settings::default(), None);
        assert!(s.auth_ok);
        assert_eq!(s.try_login(""), Gate::Granted);
        assert!(Session::new(Settings::default(), Some(String::new())).auth_ok);
    }

    #[test]
    fn correct_password_unlocks_and_resets() {
        let mut s = locked_session();
        assert!(!s.auth_ok);
        assert!(matches!(s.try_login("nope"), Gate::Wrong { hint: false, .. }));
        assert_eq!(s.try_login("s3cret"), Gate::Granted);
        assert!(s.auth_ok);
        assert_eq!(s.login_tries, 0);
    }

    #[test]
    fn messages_escalate_then_lock() {
        let mut s = locked_session();
        assert_eq!(s.try_login(""), Gate::Blank);
        assert_eq!(s.login_tries, 0);
        assert_eq!(
            s.try_login("a"),
            Gate::Wrong { message: "Wrong password. Try again.".into(), hint: false }
        );
        for n in 2..MAX_LOGIN_TRIES {
            assert_eq!(
                s.try_login("a"),
                Gate::Wrong { message: format!("Wrong password. Attempts: {n}/5."), hint: true }
            );
        }
        assert_eq!(s.try_login("a"), Gate::Locked);
        // Even the right password is refused once locked.
        assert_eq!(s.try_login("s3cret"), Gate::Locked);
        assert!(!s.auth_ok);
    }

    #[test]
    fn data_is_required_before_reports() {
        let s = Session::new(Settings::default(), None);
        assert!(s.data().is_err());
        assert!(handle_overview(&s).is_err());
    }

    #[test]
    fn summary_reflects_filter_and_method() {
        let (data, _) = loader::load_from_bytes(SAMPLE.as_bytes()).unwrap();
        let settings = Settings::default();
        let summary = build_summary(&settings, &data);
        assert_eq!(summary.cutoff, "30/06/2025");
        assert_eq!((summary.total_records, summary.pending_records), (4, 2));
        assert_eq!(summary.pending_pct, 50.0);
        assert_eq!(summary.categories, 2);
        assert_eq!(summary.method, "ceil");
        // 8553: ceil(1.8) - 2 = 0; 9999: ceil(1.8) - 0 = 2.
        assert_eq!(summary.total_shortfall, 2);

        let only = Settings { filter: types::CategoryFilter::parse("9999"), ..Settings::default() };
        let summary = build_summary(&only, &data);
        assert_eq!((summary.total_records, summary.pending_records), (2, 0));
    }

    #[test]
    fn batch_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("eps.csv");
        std::fs::write(&input, SAMPLE).unwrap();
        let out = dir.path().join("out");

        let settings = Settings { out_dir: out.clone(), scale: 1, ..Settings::default() };
        let mut session = Session::new(settings, None);
        session.source = Some(input);
        run_batch(&mut session).unwrap();

        for name in [
            charts::DONUT_PNG,
            charts::DONUT_SVG,
            charts::BARS_PNG,
            charts::BARS_SVG,
            output::PENDING_XLSX,
            output::PER_CATEGORY_XLSX,
            output::PENDING_CSV,
            output::SUMMARY_JSON,
            "UOR Centro Pendentes.xlsx",
            "UOR Norte Pendentes.xlsx",
        ] {
            assert!(out.join(name).is_file(), "missing {name}");
        }
        let summary: serde_json::Value =
            serde_json::from_slice(&std::fs::read(out.join(output::SUMMARY_JSON)).unwrap()).unwrap();
        assert_eq!(summary["pending_records"], 2);
    }

    #[test]
    fn donut_is_titled_with_the_snapshot_cutoff() {
        let (data, _) = loader::load_from_bytes(SAMPLE.as_bytes()).unwrap();
        let settings = Settings { scale: 1, ..Settings::default() };
        let earlier = parse_cutoff("01/01/2025").unwrap();
        let snap = Snapshot::build(&data, earlier);
        let files = donut_files(&settings, &data, &snap);
        let names: Vec<_> = files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, [charts::DONUT_PNG, charts::DONUT_SVG]);
        let svg = String::from_utf8(files[1].1.as_ref().unwrap().clone()).unwrap();
        assert!(svg.contains("01/01/2025"));
        assert!(!svg.contains(&format_date(settings.cutoff)));
    }

    #[test]
    fn colliding_unit_extracts_are_both_kept() {
        let csv = "\
2001,Eva,S,01/01/2025,Vencido,,Vermelho,Caixa,8553,GEREL,1,A/B,12,Ajure Sul
2002,Ivo,S,02/01/2025,Vencido,,Vermelho,Caixa,8553,GEREL,2,A_B,12,Ajure Sul
";
        let dir = tempfile::tempdir().unwrap();
        let (data, _) = loader::load_from_bytes(csv.as_bytes()).unwrap();
        let settings = Settings { out_dir: dir.path().to_path_buf(), scale: 1, ..Settings::default() };
        let outcomes = export_all(&settings, &data);
        assert!(outcomes.iter().all(|(_, r)| r.is_ok()));

        let names: Vec<_> = outcomes.iter().map(|(n, _)| n.as_str()).collect();
        assert!(names.contains(&"A_B Pendentes.xlsx"));
        assert!(names.contains(&"A_B Pendentes (2).xlsx"));
        assert!(dir.path().join("A_B Pendentes.xlsx").is_file());
        assert!(dir.path().join("A_B Pendentes (2).xlsx").is_file());
    }

    #[test]
    fn batch_without_input_fails() {
        let mut session = Session::new(Settings::default(), None);
        assert!(run_batch(&mut session).is_err());
    }

    #[test]
    fn failed_exports_are_reported_individually() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the output directory should be.
        let blocker = dir.path().join("out");
        std::fs::write(&blocker, b"").unwrap();
        let (data, _) = loader::load_from_bytes(SAMPLE.as_bytes()).unwrap();
        let settings = Settings { out_dir: blocker, scale: 1, ..Settings::default() };
        let outcomes = export_all(&settings, &data);
        assert!(outcomes.len() >= 8);
        assert!(outcomes.iter().all(|(_, r)| r.is_err()));
    }
}
