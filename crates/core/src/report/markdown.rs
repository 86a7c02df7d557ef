//! Markdown report renderer.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::types::{RenderedReport, ReportData};

pub fn render_markdown(data: &ReportData, generated_at: DateTime<Utc>) -> RenderedReport {
    let mut out = String::new();
    let _ = writeln!(out, "# Rate of Fire Performance Test Report\n");
    let _ = writeln!(
        out,
        "Generated: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let _ = writeln!(out, "## Test Configuration\n");
    let _ = writeln!(out, "- **API Endpoint:** `{}`", data.action_url);
    let _ = writeln!(out, "- **Method:** {}", data.method);
    let _ = writeln!(out, "- **Requests Per Minute:** {}", data.requests_per_minute);
    let _ = writeln!(out, "- **Number of Competitors:** {}", data.competitor_count);
    let _ = writeln!(
        out,
        "- **Test Duration:** {:.2} seconds",
        data.test_duration_secs
    );
    let _ = writeln!(
        out,
        "- **SQL Matrix Duration:** {} seconds\n",
        data.matrix_duration_secs
    );

    let _ = writeln!(out, "## Overall Results\n");
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "| ------ | ----- |");
    let _ = writeln!(out, "| Total Requests | {} |", data.overall.total);
    let _ = writeln!(out, "| Successful Requests | {} |", data.overall.passed);
    let _ = writeln!(out, "| Failed Requests | {} |", data.overall.failed);
    let _ = writeln!(out, "| Unfinished Requests | {} |", data.overall.running);
    let _ = writeln!(out, "| Success Rate | {:.2}% |", data.success_rate);
    let _ = writeln!(
        out,
        "| Requests Per Second | {:.2} |\n",
        data.requests_per_second
    );

    let _ = writeln!(out, "## Competitor Results\n");
    let _ = writeln!(out, "| Competitor | Total | Successful | Failed | Unfinished |");
    let _ = writeln!(out, "| ---------- | ----- | ---------- | ------ | ---------- |");
    for competitor in &data.competitors {
        let c = &competitor.counters;
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            competitor.name, c.total, c.passed, c.failed, c.running
        );
    }

    RenderedReport {
        filename: super::report_filename("rate-of-fire-report", "md", generated_at),
        content_type: "text/markdown",
        content: out,
    }
}
