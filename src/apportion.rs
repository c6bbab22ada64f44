// How many more pending records each Prefixo needs to reach the target
// share (90%).
//
// Two methods are offered and neither keeps state between calls:
// - `Ceiling` rounds every category up on its own, so the grand total can
//   drift above the globally rounded target.
// - `LargestRemainder` (Hamilton) floors every ideal shortfall, rounds the
//   sum of ideals once, and hands the missing units to the biggest
//   fractional remainders. Ties go to the category that comes first in
//   table order.
use crate::reports::pending_share;
use crate::types::{ApportionmentRow, ApportionmentTableRow, CategoryAggregate};
use std::fmt;

pub const TARGET_RATIO: f64 = 0.90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Ceiling,
    LargestRemainder,
}

impl Method {
    pub fn toggled(self) -> Self {
        match self {
            Method::Ceiling => Method::LargestRemainder,
            Method::LargestRemainder => Method::Ceiling,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Ceiling => f.write_str("ceil"),
            Method::LargestRemainder => f.write_str("largest remainder"),
        }
    }
}

pub fn apportion(aggregates: &[CategoryAggregate], target: f64, method: Method) -> Vec<ApportionmentRow> {
    let shortfalls = match method {
        Method::Ceiling => ceiling_shortfalls(aggregates, target),
        Method::LargestRemainder => largest_remainder_shortfalls(aggregates, target),
    };
    aggregates
        .iter()
        .zip(shortfalls)
        .map(|(a, shortfall)| {
            let target_count = match method {
                Method::Ceiling => ceil_target(a.total, target),
                Method::LargestRemainder => a.pending + shortfall,
            };
            ApportionmentRow {
                key: a.key.clone(),
                total: a.total,
                pending: a.pending,
                ratio: a.ratio,
                target_count,
                shortfall,
            }
        })
        .collect()
}

fn ceil_target(total: usize, target: f64) -> usize {
    (target * total as f64).ceil().max(0.0) as usize
}

pub fn ceiling_shortfalls(aggregates: &[CategoryAggregate], target: f64) -> Vec<usize> {
    aggregates
        .iter()
        .map(|a| ceil_target(a.total, target).saturating_sub(a.pending))
        .collect()
}

pub fn largest_remainder_shortfalls(aggregates: &[CategoryAggregate], target: f64) -> Vec<usize> {
    let ideal: Vec<f64> = aggregates
        .iter()
        .map(|a| (target * a.total as f64 - a.pending as f64).max(0.0))
        .collect();
    let mut alloc: Vec<usize> = ideal.iter().map(|v| v.floor() as usize).collect();
    let remainders: Vec<f64> = ideal.iter().zip(&alloc).map(|(v, base)| v - *base as f64).collect();

    // Rounded once, half to even.
    let budget = ideal.iter().sum::<f64>().round_ties_even() as usize;
    let to_allocate = budget.saturating_sub(alloc.iter().sum());

    let mut order: Vec<usize> = (0..ideal.len()).collect();
    // Stable: equal remainders keep table order.
    order.sort_by(|&a, &b| remainders[b].total_cmp(&remainders[a]));
    for &idx in order.iter().take(to_allocate) {
        alloc[idx] += 1;
    }
    alloc
}

/// Grand totals shown under the target table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validation {
    pub total: usize,
    pub pending: usize,
    pub shortfall: usize,
    pub final_pending: usize,
    pub final_pct: f64,
}

pub fn validate(rows: &[ApportionmentRow]) -> Validation {
    let total: usize = rows.iter().map(|r| r.total).sum();
    let pending: usize = rows.iter().map(|r| r.pending).sum();
    let shortfall: usize = rows.iter().map(|r| r.shortfall).sum();
    let final_pending = pending + shortfall;
    Validation {
        total,
        pending,
        shortfall,
        final_pending,
        final_pct: pending_share(total, final_pending),
    }
}

pub fn apportionment_table(rows: &[ApportionmentRow]) -> Vec<ApportionmentTableRow> {
    rows.iter()
        .map(|r| ApportionmentTableRow {
            prefixo: r.key.to_string(),
            total: r.total,
            pending: r.pending,
            ratio: format!("{:.1}%", r.ratio),
            target_count: r.target_count,
            shortfall: r.shortfall,
        })
        .collect()
}
