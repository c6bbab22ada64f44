use crate::types::{
    CategoryAggregate, CategoryFilter, CategoryKey, CategoryOption, CategoryTableRow, Kpis,
    PreviewRow, Record,
};
use crate::util::format_date;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Everything derived from one dataset and one cutoff.
///
/// Rebuilt from scratch whenever the cutoff, the filter or the file
/// changes; nothing here is carried over between runs.
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    pub cutoff: NaiveDate,
    pub pending: Vec<&'a Record>,
    pub aggregates: Vec<CategoryAggregate>,
}

impl<'a> Snapshot<'a> {
    pub fn build(data: &'a [Record], cutoff: NaiveDate) -> Self {
        let pending = pending_records(data, cutoff);
        let aggregates = aggregate_by_category(data, &pending);
        Snapshot { cutoff, pending, aggregates }
    }
}

/// A record is pending when its last EPS date is known and strictly
/// before the cutoff. A missing date is never pending.
pub fn is_pending(record: &Record, cutoff: NaiveDate) -> bool {
    matches!(record.last_compliance_date, Some(d) if d < cutoff)
}

pub fn pending_records(data: &[Record], cutoff: NaiveDate) -> Vec<&Record> {
    data.iter().filter(|r| is_pending(r, cutoff)).collect()
}

/// `pending / total * 100`, or 0 when there is nothing to divide by.
pub fn pending_share(total: usize, pending: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = pending as f64 / total as f64 * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

pub fn aggregate_by_category(data: &[Record], pending: &[&Record]) -> Vec<CategoryAggregate> {
    let mut totals: BTreeMap<CategoryKey, usize> = BTreeMap::new();
    for r in data {
        *totals.entry(r.category_key()).or_default() += 1;
    }
    let mut pend: BTreeMap<CategoryKey, usize> = BTreeMap::new();
    for r in pending {
        *pend.entry(r.category_key()).or_default() += 1;
    }

    let keys: BTreeSet<&CategoryKey> = totals.keys().chain(pend.keys()).collect();
    keys.into_iter()
        .map(|key| {
            let total = totals.get(key).copied().unwrap_or(0);
            let pending = pend.get(key).copied().unwrap_or(0);
            CategoryAggregate {
                key: key.clone(),
                total,
                pending,
                ratio: pending_share(total, pending),
            }
        })
        .collect()
}

pub fn filter_kpis(data: &[Record], pending: &[&Record], filter: &CategoryFilter) -> Kpis {
    let total = data.iter().filter(|r| filter.matches(r)).count();
    let pending = pending.iter().filter(|r| filter.matches(r)).count();
    Kpis { ratio: pending_share(total, pending), total, pending }
}

fn label_or_na(v: Option<&str>) -> &str {
    v.unwrap_or("NA")
}

/// Selector entries: "All", then `"<Prefixo> – <Dependencia>"` for each
/// Prefixo (first Dependencia seen), then `"NA – NA"` when some records
/// have no Prefixo.
pub fn category_options(data: &[Record]) -> Vec<CategoryOption> {
    let mut first_dep: BTreeMap<&str, Option<&str>> = BTreeMap::new();
    let mut has_missing = false;
    for r in data {
        match r.category.as_deref() {
            Some(p) => {
                first_dep.entry(p).or_insert(r.department.as_deref());
            }
            None => has_missing = true,
        }
    }

    let mut out = vec![CategoryOption { label: "All".to_string(), filter: CategoryFilter::All }];
    out.extend(first_dep.into_iter().map(|(p, dep)| CategoryOption {
        label: format!("{} – {}", p, label_or_na(dep)),
        filter: CategoryFilter::Only(CategoryKey::Value(p.to_string())),
    }));
    if has_missing {
        out.push(CategoryOption {
            label: "NA – NA".to_string(),
            filter: CategoryFilter::Only(CategoryKey::Missing),
        });
    }
    out
}

/// Turn a selector label back into a filter.
pub fn filter_from_label(label: &str) -> CategoryFilter {
    let label = label.trim();
    if label == "All" || label == "Todos" {
        return CategoryFilter::All;
    }
    if label == "NA" || label.starts_with("NA –") {
        return CategoryFilter::Only(CategoryKey::Missing);
    }
    let prefixo = label.split(" – ").next().unwrap_or(label);
    CategoryFilter::parse(prefixo)
}

/// Distinct UORs (org units) among all records of one Prefixo, `NA` for
/// the blank ones, sorted.
pub fn org_units_for(data: &[Record], prefixo: &str) -> Vec<String> {
    data.iter()
        .filter(|r| r.category.as_deref() == Some(prefixo))
        .map(|r| label_or_na(r.org_unit.as_deref()).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn pending_for_unit<'a>(pending: &[&'a Record], prefixo: &str, unit: &str) -> Vec<&'a Record> {
    pending
        .iter()
        .copied()
        .filter(|r| r.category.as_deref() == Some(prefixo))
        .filter(|r| match r.org_unit.as_deref() {
            None => unit == "NA",
            Some(u) => u == unit,
        })
        .collect()
}

/// Pending records grouped by Prefixo, in table order.
pub fn pending_by_category<'a>(pending: &[&'a Record]) -> Vec<(CategoryKey, Vec<&'a Record>)> {
    let mut groups: BTreeMap<CategoryKey, Vec<&'a Record>> = BTreeMap::new();
    for &r in pending {
        groups.entry(r.category_key()).or_default().push(r);
    }
    groups.into_iter().collect()
}

pub fn category_table(aggregates: &[CategoryAggregate]) -> Vec<CategoryTableRow> {
    aggregates
        .iter()
        .map(|a| CategoryTableRow {
            prefixo: a.key.to_string(),
            total: a.total,
            pending: a.pending,
            ratio: format!("{:.2}", a.ratio),
        })
        .collect()
}

pub fn preview_rows(data: &[Record], max_rows: usize) -> Vec<PreviewRow> {
    data.iter()
        .take(max_rows)
        .map(|r| PreviewRow {
            id: r.id.clone().unwrap_or_default(),
            name: r.name.clone().unwrap_or_default(),
            last_compliance_date: r.last_compliance_date.map(format_date).unwrap_or_else(|| "NA".into()),
            prefixo: label_or_na(r.category.as_deref()).to_string(),
            department: label_or_na(r.department.as_deref()).to_string(),
            org_unit: label_or_na(r.org_unit.as_deref()).to_string(),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::types::Record;
    use chrono::NaiveDate;

    pub fn record(category: Option<&str>, date: Option<(i32, u32, u32)>) -> Record {
        Record {
            id: Some("1".into()),
            name: Some("Pessoa".into()),
            evaluable_flag: Some("S".into()),
            last_compliance_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            compliance_status: Some("Vencido".into()),
            days_to_due: Some(10.0),
            status_indicator: Some("Vermelho".into()),
            role: Some("Caixa".into()),
            category: category.map(str::to_string),
            department: category.map(|c| format!("Dep {c}")),
            org_unit_code: Some("77".into()),
            org_unit: Some("UOR Centro".into()),
            secondary_category: None,
            secondary_org: None,
        }
    }

    /// Ten records: A 5 total / 2 pending, B 3 / 3, C 2 / 0, with a
    /// 30/06/2025 cutoff.
    pub fn ten_records() -> Vec<Record> {
        let old = Some((2025, 1, 10));
        let new = Some((2025, 8, 1));
        vec![
            record(Some("A"), old),
            record(Some("A"), old),
            record(Some("A"), new),
            record(Some("A"), new),
            record(Some("A"), None),
            record(Some("B"), old),
            record(Some("B"), old),
            record(Some("B"), old),
            record(Some("C"), new),
            record(Some("C"), new),
        ]
    }

    pub fn cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{cutoff, record, ten_records};
    use super::*;

    #[test]
    fn pending_is_strictly_before_cutoff() {
        let on_cutoff = record(Some("A"), Some((2025, 6, 30)));
        let day_before = record(Some("A"), Some((2025, 6, 29)));
        let missing = record(Some("A"), None);
        assert!(!is_pending(&on_cutoff, cutoff()));
        assert!(is_pending(&day_before, cutoff()));
        assert!(!is_pending(&missing, cutoff()));
    }

    #[test]
    fn aggregates_match_worked_example() {
        let data = ten_records();
        let snap = Snapshot::build(&data, cutoff());
        assert_eq!(snap.pending.len(), 5);
        let got: Vec<(String, usize, usize)> = snap
            .aggregates
            .iter()
            .map(|a| (a.key.to_string(), a.total, a.pending))
            .collect();
        assert_eq!(
            got,
            vec![("A".into(), 5, 2), ("B".into(), 3, 3), ("C".into(), 2, 0)]
        );
        assert_eq!(snap.aggregates[0].ratio, 40.0);
        assert_eq!(snap.aggregates[1].ratio, 100.0);
        assert_eq!(snap.aggregates[2].ratio, 0.0);
    }

    #[test]
    fn counts_and_ratios_stay_in_bounds() {
        let mut data = ten_records();
        data.push(record(None, Some((2024, 1, 1))));
        data.push(record(None, None));
        let snap = Snapshot::build(&data, cutoff());
        for a in &snap.aggregates {
            assert!(a.pending <= a.total);
            assert!((0.0..=100.0).contains(&a.ratio));
        }
        assert!(snap.pending.len() <= data.len());
        let na = snap.aggregates.last().unwrap();
        assert_eq!(na.key, CategoryKey::Missing);
        assert_eq!((na.total, na.pending), (2, 1));
    }

    #[test]
    fn unparsed_date_counts_in_total_only() {
        let data = vec![record(Some("A"), None), record(Some("A"), Some((2025, 1, 1)))];
        let snap = Snapshot::build(&data, cutoff());
        assert_eq!(snap.aggregates.len(), 1);
        assert_eq!((snap.aggregates[0].total, snap.aggregates[0].pending), (2, 1));
    }

    #[test]
    fn empty_dataset_has_zero_share() {
        assert_eq!(pending_share(0, 0), 0.0);
        let kpis = filter_kpis(&[], &[], &CategoryFilter::All);
        assert_eq!(kpis, Kpis { ratio: 0.0, total: 0, pending: 0 });
    }

    #[test]
    fn kpis_follow_filter() {
        let mut data = ten_records();
        data.push(record(None, Some((2024, 1, 1))));
        let pending = pending_records(&data, cutoff());

        let all = filter_kpis(&data, &pending, &CategoryFilter::All);
        assert_eq!((all.total, all.pending), (11, 6));

        let b = filter_kpis(&data, &pending, &CategoryFilter::parse("B"));
        assert_eq!((b.total, b.pending, b.ratio), (3, 3, 100.0));

        let na = filter_kpis(&data, &pending, &CategoryFilter::parse("NA"));
        assert_eq!((na.total, na.pending), (1, 1));

        let unknown = filter_kpis(&data, &pending, &CategoryFilter::parse("Z"));
        assert_eq!(unknown.ratio, 0.0);
    }

    #[test]
    fn options_list_first_department_and_na() {
        let mut data = vec![
            record(Some("8553"), None),
            record(Some("0012"), None),
            record(None, None),
        ];
        data[0].department = None;
        let mut second = record(Some("8553"), None);
        second.department = Some("Later".into());
        data.push(second);

        let labels: Vec<String> = category_options(&data).into_iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!["All", "0012 – Dep 0012", "8553 – NA", "NA – NA"]);
    }

    #[test]
    fn labels_parse_back_to_filters() {
        assert_eq!(filter_from_label("All"), CategoryFilter::All);
        assert_eq!(filter_from_label("NA – NA"), CategoryFilter::Only(CategoryKey::Missing));
        assert_eq!(
            filter_from_label("8553 – GEREL"),
            CategoryFilter::Only(CategoryKey::Value("8553".into()))
        );
        assert_eq!(
            filter_from_label("NAVE – X"),
            CategoryFilter::Only(CategoryKey::Value("NAVE".into()))
        );
    }

    #[test]
    fn unit_lookup_uses_all_records_but_filters_pending() {
        let mut data = vec![
            record(Some("8553"), Some((2025, 1, 1))),
            record(Some("8553"), Some((2025, 9, 1))),
            record(Some("8553"), Some((2025, 2, 1))),
            record(Some("9999"), Some((2025, 1, 1))),
        ];
        data[1].org_unit = Some("UOR Norte".into());
        data[2].org_unit = None;

        assert_eq!(org_units_for(&data, "8553"), vec!["NA", "UOR Centro", "UOR Norte"]);

        let pending = pending_records(&data, cutoff());
        assert_eq!(pending_for_unit(&pending, "8553", "UOR Centro").len(), 1);
        assert_eq!(pending_for_unit(&pending, "8553", "UOR Norte").len(), 0);
        assert_eq!(pending_for_unit(&pending, "8553", "NA").len(), 1);
    }

    #[test]
    fn pending_groups_follow_table_order() {
        let mut data = ten_records();
        data.push(record(None, Some((2024, 1, 1))));
        let pending = pending_records(&data, cutoff());
        let groups = pending_by_category(&pending);
        let keys: Vec<String> = groups.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["A", "B", "NA"]);
        assert_eq!(groups[1].1.len(), 3);
    }
}
