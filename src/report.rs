//! End-of-run summary output

use anyhow::Result;
use certload_core::{ScenarioReport, Thresholds};
use serde_json::json;
use std::fmt::Write;

/// Render a report as an aligned text block.
pub fn render(report: &ScenarioReport, thresholds: &Thresholds) -> String {
    let mut out = String::new();
    let lat = &report.latency;
    let secs = (report.elapsed_ms as f64 / 1000.0).max(f64::EPSILON);

    let _ = writeln!(out, "\nscenario: {}", report.name);
    let _ = writeln!(
        out,
        "  iterations....: {} started of {} due ({} target), {} skipped, {:.2}/s",
        report.started,
        report.scheduled,
        report.target,
        report.skipped,
        report.completed() as f64 / secs
    );
    let _ = writeln!(
        out,
        "  checks........: {:.2}% ✓ {} ✗ {} errors {}",
        report.pass_rate() * 100.0,
        report.passed,
        report.failed,
        report.errored
    );
    let _ = writeln!(
        out,
        "  duration......: avg={:.2}ms min={:.2}ms med={:.2}ms max={:.2}ms p(90)={:.2}ms p(95)={:.2}ms p(99)={:.2}ms",
        lat.avg_ms, lat.min_ms, lat.p50_ms, lat.max_ms, lat.p90_ms, lat.p95_ms, lat.p99_ms
    );
    for (key, count) in &report.errors {
        let _ = writeln!(out, "  error.........: {} x{}", key, count);
    }
    for result in report.evaluate(thresholds) {
        let _ = writeln!(
            out,
            "  {} {} (observed {:.2})",
            if result.passed { "✓" } else { "✗" },
            result.criterion,
            result.observed
        );
    }
    out
}

/// Serialize a report with its threshold results.
pub fn to_json(report: &ScenarioReport, thresholds: &Thresholds) -> Result<String> {
    let value = json!({
        "report": report,
        "thresholds": report.evaluate(thresholds),
        "passed": report.meets(thresholds),
    });
    Ok(serde_json::to_string(&value)?)
}
