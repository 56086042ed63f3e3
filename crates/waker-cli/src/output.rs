use serde::Serialize;
use waker_core::WakeReport;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    for line in render_table(headers, &rows) {
        println!("{line}");
    }
}

/// Column-aligned lines: header, separator, then one line per row.
/// Widths are measured in chars because masked tokens contain `…`.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let pad = |cell: &str, width: usize| {
        let fill = width.saturating_sub(cell.chars().count());
        format!("{cell}{}", " ".repeat(fill))
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| pad(h, widths[i]))
        .collect();
    lines.push(header.join("  ").trim_end().to_string());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    lines.push(sep.join("  "));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| pad(cell, widths.get(i).copied().unwrap_or(0)))
            .collect();
        lines.push(cells.join("  ").trim_end().to_string());
    }
    lines
}

/// Per-account table followed by the summary line.
pub fn print_report(report: &WakeReport) {
    let rows = report
        .per_account
        .iter()
        .map(|a| {
            vec![
                a.name.clone(),
                a.outcome.as_str().to_string(),
                a.outcome.reason().unwrap_or("").to_string(),
            ]
        })
        .collect();
    print_table(&["ACCOUNT", "OUTCOME", "DETAIL"], rows);
    println!();
    println!("{}", summary_line(report));
}

fn summary_line(report: &WakeReport) -> String {
    let mut line = format!(
        "{} succeeded, {} failed",
        report.success_count, report.fail_count
    );
    if report.interrupted {
        line.push_str(" (interrupted)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use waker_core::WakeOutcome;

    #[test]
    fn columns_align_on_chars() {
        let rows = vec![
            vec!["primary".to_string(), "sk-ant\u{2026}wxyz".to_string()],
            vec!["b".to_string(), "***".to_string()],
        ];
        let lines = render_table(&["NAME", "TOKEN"], &rows);
        assert_eq!(lines[0], "NAME     TOKEN");
        assert_eq!(lines[1], "-------  -----------");
        assert_eq!(lines[2], "primary  sk-ant\u{2026}wxyz");
        assert_eq!(lines[3], "b        ***");
    }

    #[test]
    fn summary_mentions_interruption() {
        let mut report = WakeReport::default();
        report.record("a", WakeOutcome::Success);
        report.record("b", WakeOutcome::failure("boom"));
        assert_eq!(summary_line(&report), "1 succeeded, 1 failed");

        report.interrupted = true;
        assert_eq!(summary_line(&report), "1 succeeded, 1 failed (interrupted)");
    }
}
