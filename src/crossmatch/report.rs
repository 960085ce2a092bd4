//! Plain-text summary reporting for a finished crossmatch run.

use std::collections::HashMap;
use std::fmt::Write;

use crate::model::{CrossmatchStatus, PendingReason, TriageStatus};

type TallyKey = (CrossmatchStatus, TriageStatus, Option<PendingReason>);

/// Prints the verdict tally as a table sorted by descending count.
pub(crate) fn print_summary(counts: &HashMap<TallyKey, u64>, total: u64) {
    print!("{}", render_summary(counts, total));
}

fn reason_str(reason: Option<PendingReason>) -> &'static str {
    reason.map(|reason| reason.as_str()).unwrap_or("")
}

fn render_summary(counts: &HashMap<TallyKey, u64>, total: u64) -> String {
    let pct = |count: u64| {
        if total == 0 {
            0.0
        } else {
            100.0 * count as f64 / total as f64
        }
    };

    let mut keys = counts
        .iter()
        .filter(|(_, &count)| count > 0)
        .map(|(key, _)| key)
        .collect::<Vec<_>>();
    keys.sort_by(|a, b| {
        counts[*b]
            .cmp(&counts[*a])
            .then_with(|| a.0.as_str().cmp(b.0.as_str()))
            .then_with(|| a.1.as_str().cmp(b.1.as_str()))
            .then_with(|| reason_str(a.2).cmp(reason_str(b.2)))
    });

    let rows = keys
        .iter()
        .map(|key| {
            vec![
                key.0.as_str().to_string(),
                key.1.as_str().to_string(),
                reason_str(key.2).to_string(),
                counts[*key].to_string(),
                format!("{:>5.1}%", pct(counts[*key])),
            ]
        })
        .collect::<Vec<_>>();

    render_table(
        &["Status", "Triage", "Reason", "Count", "%"],
        &rows,
        &format!("Total records: {total}\n"),
    )
}

/// Renders a table with two-space column gaps, the last two columns
/// right-aligned and a dashed rule under the header.
fn render_table(headers: &[&str], rows: &[Vec<String>], title: &str) -> String {
    let ncols = headers.len();
    let right_align_from = ncols.saturating_sub(2);

    let mut widths = headers.iter().map(|header| header.len()).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    if !title.is_empty() {
        out.push_str(title);
        out.push('\n');
    }

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        if i >= right_align_from {
            let _ = write!(out, "{header:>width$}", width = widths[i]);
        } else {
            let _ = write!(out, "{header:<width$}", width = widths[i]);
        }
    }
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * (ncols - 1)));
    out.push('\n');

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push_str("  ");
            }
            if i >= right_align_from {
                let _ = write!(out, "{cell:>width$}", width = widths[i]);
            } else {
                let _ = write!(out, "{cell:<width$}", width = widths[i]);
            }
        }
        out.push('\n');
    }
    out
}
