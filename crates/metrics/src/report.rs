//! Static HTML metrics dashboard

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::store::write_atomic;
use crate::types::{FlakyTest, RunStats, SlowTest, TestOutcome, TestStatus};

/// Snapshot of everything the dashboard shows
#[derive(Debug, Clone)]
pub struct DashboardReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub stats: RunStats,
    pub flaky: Vec<FlakyTest>,
    pub slowest: Vec<SlowTest>,
    /// Newest first
    pub recent: Vec<&'a TestOutcome>,
}

const STYLE: &str = r#"
    body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 2rem; background: #f5f7fa; color: #1f2933; }
    h1 { margin-bottom: 0.25rem; }
    .generated { color: #616e7c; margin-top: 0; }
    .cards { display: flex; gap: 1rem; flex-wrap: wrap; margin: 1.5rem 0; }
    .card { background: #fff; border-radius: 8px; padding: 1rem 1.5rem; min-width: 140px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
    .card .value { font-size: 1.8rem; font-weight: 600; }
    .card .label { color: #616e7c; font-size: 0.85rem; text-transform: uppercase; }
    .passed { color: #2f9e44; }
    .failed { color: #e03131; }
    .skipped { color: #868e96; }
    section { background: #fff; border-radius: 8px; padding: 1rem 1.5rem; margin-bottom: 1.5rem; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
    table { width: 100%; border-collapse: collapse; }
    th, td { text-align: left; padding: 0.5rem; border-bottom: 1px solid #e4e7eb; }
    th { background: #f0f4f8; }
    .empty { color: #616e7c; font-style: italic; }
    .error { font-family: monospace; font-size: 0.85rem; color: #c92a2a; }
"#;

impl DashboardReport<'_> {
    /// Render a self-contained HTML document
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(8 * 1024);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("  <meta charset=\"utf-8\">\n");
        html.push_str("  <title>Test Metrics Dashboard</title>\n");
        let _ = writeln!(html, "  <style>{}</style>", STYLE);
        html.push_str("</head>\n<body>\n");
        html.push_str("  <h1>Test Metrics Dashboard</h1>\n");
        let _ = writeln!(
            html,
            "  <p class=\"generated\">Generated {}</p>",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        self.render_summary(&mut html);
        self.render_flaky(&mut html);
        self.render_slowest(&mut html);
        self.render_recent(&mut html);

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Render and fully overwrite `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.render().as_bytes())
    }

    fn render_summary(&self, html: &mut String) {
        let stats = &self.stats;
        html.push_str("  <div class=\"cards\">\n");
        card(html, "Total", &stats.total.to_string(), "");
        card(html, "Passed", &stats.passed.to_string(), "passed");
        card(html, "Failed", &stats.failed.to_string(), "failed");
        card(html, "Skipped", &stats.skipped.to_string(), "skipped");
        card(html, "Pass Rate", &format!("{:.1}%", stats.pass_rate), "");
        card(html, "Avg Duration", &format!("{:.0} ms", stats.average_duration_ms), "");
        html.push_str("  </div>\n");
    }

    fn render_flaky(&self, html: &mut String) {
        html.push_str("  <section>\n    <h2>Flaky Tests</h2>\n");
        if self.flaky.is_empty() {
            html.push_str("    <p class=\"empty\">No flaky tests detected.</p>\n");
        } else {
            html.push_str("    <table>\n      <tr><th>Test</th><th>Failure Rate</th><th>Runs</th></tr>\n");
            for test in &self.flaky {
                let _ = writeln!(
                    html,
                    "      <tr><td>{}</td><td class=\"failed\">{:.1}%</td><td>{}</td></tr>",
                    escape_html(&test.name),
                    test.rate * 100.0,
                    test.total_runs
                );
            }
            html.push_str("    </table>\n");
        }
        html.push_str("  </section>\n");
    }

    fn render_slowest(&self, html: &mut String) {
        html.push_str("  <section>\n    <h2>Slowest Passing Tests</h2>\n");
        if self.slowest.is_empty() {
            html.push_str("    <p class=\"empty\">No passing tests recorded.</p>\n");
        } else {
            html.push_str("    <table>\n      <tr><th>Test</th><th>Duration</th></tr>\n");
            for test in &self.slowest {
                let _ = writeln!(
                    html,
                    "      <tr><td>{}</td><td>{} ms</td></tr>",
                    escape_html(&test.name),
                    test.duration_ms
                );
            }
            html.push_str("    </table>\n");
        }
        html.push_str("  </section>\n");
    }

    fn render_recent(&self, html: &mut String) {
        html.push_str("  <section>\n    <h2>Recent Results</h2>\n");
        if self.recent.is_empty() {
            html.push_str("    <p class=\"empty\">No results recorded.</p>\n");
        } else {
            html.push_str(
                "    <table>\n      <tr><th>Test</th><th>Status</th><th>Duration</th><th>Retries</th><th>Recorded</th><th>Error</th></tr>\n",
            );
            for record in &self.recent {
                let _ = writeln!(
                    html,
                    "      <tr><td>{}</td><td class=\"{}\">{}</td><td>{} ms</td><td>{}</td><td>{}</td><td class=\"error\">{}</td></tr>",
                    escape_html(&record.test_name),
                    record.status,
                    status_glyph(record.status),
                    record.duration_ms,
                    record.retries.unwrap_or(0),
                    record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    escape_html(record.error.as_deref().unwrap_or("")),
                );
            }
            html.push_str("    </table>\n");
        }
        html.push_str("  </section>\n");
    }
}

fn card(html: &mut String, label: &str, value: &str, class: &str) {
    let _ = writeln!(
        html,
        "    <div class=\"card\"><div class=\"value {}\">{}</div><div class=\"label\">{}</div></div>",
        class, value, label
    );
}

fn status_glyph(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Passed => "✓ passed",
        TestStatus::Failed => "✗ failed",
        TestStatus::Skipped => "○ skipped",
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
