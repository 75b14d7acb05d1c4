use crate::stats::ContributionStats;
use crate::window::TimeWindow;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

const MIN_ALIGN_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

pub fn render(stats: &ContributionStats, window: &TimeWindow, format: Format) -> Result<String> {
    match format {
        Format::Text => Ok(render_text(stats, window)),
        Format::Json => render_json(stats, window),
    }
}

/// `key: ....... value`, padded so that values line up at `align_width`.
fn build_stat_row(key: &str, value: &str, align_width: usize) -> String {
    let key_part = format!("{key}: ");
    let available = align_width.saturating_sub(key_part.len() + value.len());

    let dots = match available {
        0 => "".to_string(),
        1 => " ".to_string(),
        2 => ". ".to_string(),
        n => format!("{} ", ".".repeat(n - 1)),
    };

    format!("{key_part}{dots}{value}")
}

fn build_header_line(label: &str, align_width: usize) -> String {
    let base = format!("{label} ");
    let dash_count = align_width.saturating_sub(base.len());
    format!("{base}{}", "-".repeat(dash_count))
}

fn render_text(stats: &ContributionStats, window: &TimeWindow) -> String {
    let by_state = [
        ("Repo opened issues", stats.open_issues.to_string()),
        ("Repo closed issues", stats.closed_issues.to_string()),
        ("Repo opened pull requests", stats.open_prs.to_string()),
        ("Repo closed pull requests", stats.closed_prs.to_string()),
    ];
    let totals = [
        ("Repos contributed to count", stats.touched_repo_count().to_string()),
        ("Total number of issues authored", stats.issues_authored().to_string()),
        ("Total pull requests", stats.pull_requests_authored().to_string()),
        ("Total pull request reviews", stats.reviewed_prs.to_string()),
    ];

    let align_width = by_state
        .iter()
        .chain(totals.iter())
        .map(|(k, v)| k.len() + 2 + v.len() + 1)
        .max()
        .unwrap_or(0)
        .max(MIN_ALIGN_WIDTH);

    let mut out = String::new();
    out.push_str(&build_header_line(
        &format!("Contributions {} .. {}", window.start(), window.end()),
        align_width,
    ));
    out.push('\n');

    for (k, v) in &by_state {
        out.push_str(&build_stat_row(k, v, align_width));
        out.push('\n');
    }
    out.push('\n');
    for (k, v) in &totals {
        out.push_str(&build_stat_row(k, v, align_width));
        out.push('\n');
    }

    if !stats.touched_repos.is_empty() {
        out.push('\n');
        out.push_str(&build_header_line("Touched repositories", align_width));
        out.push('\n');
        for name in &stats.touched_repos {
            out.push_str(name);
            out.push('\n');
        }
    }

    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    window: &'a TimeWindow,
    #[serde(flatten)]
    stats: &'a ContributionStats,
    issues_authored: u64,
    pull_requests_authored: u64,
    touched_repo_count: usize,
}

fn render_json(stats: &ContributionStats, window: &TimeWindow) -> Result<String> {
    let report = JsonReport {
        window,
        stats,
        issues_authored: stats.issues_authored(),
        pull_requests_authored: stats.pull_requests_authored(),
        touched_repo_count: stats.touched_repo_count(),
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize report")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContributionStats {
        ContributionStats {
            open_issues: 1,
            closed_issues: 2,
            open_prs: 3,
            closed_prs: 4,
            reviewed_prs: 5,
            touched_repos: ["manubot/manubot", "cytomining/pycytominer"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    #[test]
    fn stat_row_aligns_values() {
        assert_eq!(build_stat_row("Stars", "12", 14), "Stars: .... 12");
        assert_eq!(build_stat_row("Stars", "12", 9), "Stars: 12");
        assert_eq!(build_stat_row("Stars", "12", 10), "Stars:  12");
    }

    #[test]
    fn text_report_lists_counts_and_sorted_repos() {
        let window = TimeWindow::fiscal_year(2023).unwrap();
        let text = render(&sample(), &window, Format::Text).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("Contributions 2022-07-01 .. 2023-06-30 -"));
        assert!(lines[1].starts_with("Repo opened issues: ") && lines[1].ends_with(" 1"));
        assert!(lines[4].starts_with("Repo closed pull requests: ") && lines[4].ends_with(" 4"));
        assert_eq!(lines[5], "");
        assert!(lines[6].starts_with("Repos contributed to count: ") && lines[6].ends_with(" 2"));
        assert!(lines[7].ends_with(" 3"));
        assert!(lines[8].ends_with(" 7"));
        assert!(lines[9].starts_with("Total pull request reviews: ") && lines[9].ends_with(" 5"));

        let tail: Vec<&str> = lines.iter().rev().take(2).rev().copied().collect();
        assert_eq!(tail, ["cytomining/pycytominer", "manubot/manubot"]);
    }

    #[test]
    fn text_report_omits_empty_repo_section() {
        let window = TimeWindow::fiscal_year(2023).unwrap();
        let text = render(&ContributionStats::default(), &window, Format::Text).unwrap();
        assert!(!text.contains("Touched repositories"));
    }

    #[test]
    fn json_report_includes_window_and_totals() {
        let window = TimeWindow::fiscal_year(2023).unwrap();
        let json = render(&sample(), &window, Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["window"]["start"], "2022-07-01");
        assert_eq!(value["window"]["end"], "2023-06-30");
        assert_eq!(value["closed_prs"], 4);
        assert_eq!(value["issues_authored"], 3);
        assert_eq!(value["pull_requests_authored"], 7);
        assert_eq!(value["touched_repo_count"], 2);
        assert_eq!(value["touched_repos"][0], "cytomining/pycytominer");
    }
}
