//! Console rendering of progress updates and run reports.

use std::fmt::Write as _;

use crate::models::{BotReport, UpdateEvent};
use crate::orchestrator::success_count;

const RULE: &str = "==================================================";

/// Render one progress update line, prefixed with the bot index.
pub fn format_update(bot: usize, event: &UpdateEvent) -> String {
    let mut out = format!("[bot {bot}] [{}] {}", event.label(), event.message());
    if let UpdateEvent::Analysis { analysis, .. } = event {
        let _ = write!(
            out,
            "\n[bot {bot}]    analysis: {} links, {} forms",
            analysis.link_count, analysis.form_count
        );
    }
    out
}

pub fn print_update(bot: usize, event: &UpdateEvent) {
    println!("{}", format_update(bot, event));
}

/// Render the fixed report layout for a single run.
pub fn format_report(report: &BotReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "TEST REPORT");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Success: {}", report.success);
    let _ = writeln!(out, "Actions: {}", report.actions.len());
    let _ = writeln!(out, "Errors: {}", report.errors.len());

    if !report.performance.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Performance:");
        let load = report.performance.get("load_time").copied().unwrap_or(0.0);
        let _ = writeln!(out, "  Load time: {load:.0}ms");
        let response = report
            .performance
            .get("response_time")
            .copied()
            .unwrap_or(0.0);
        let _ = writeln!(out, "  Response time: {response:.0}ms");
    }

    if let Some(analysis) = &report.analysis {
        let _ = writeln!(out);
        let _ = writeln!(out, "Page analysis:");
        let _ = writeln!(out, "  Title: {}", analysis.title);
        let _ = writeln!(out, "  URL: {}", analysis.url);
        let _ = writeln!(out, "  Links: {}", analysis.link_count);
        let _ = writeln!(out, "  Forms: {}", analysis.form_count);
        let _ = writeln!(out, "  Buttons: {}", analysis.button_count);
        let _ = writeln!(out, "  Images: {}", analysis.image_count);
    }

    if !report.errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Errors:");
        for (i, error) in report.errors.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}: {}", i + 1, error.kind, error.message);
        }
    }

    if !report.actions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Actions:");
        for (i, action) in report.actions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}: {}", i + 1, action.kind, action.status);
        }
    }

    out
}

pub fn print_report(report: &BotReport) {
    print!("{}", format_report(report));
}

/// Render numbered per-bot sections followed by the aggregate summary.
pub fn format_run_summary(reports: &[BotReport]) -> String {
    let mut out = String::new();
    for (i, report) in reports.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "BOT #{} REPORT", i + 1);
        let _ = write!(out, "{}", format_report(report));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "SUMMARY: {}/{} bots succeeded",
        success_count(reports),
        reports.len()
    );
    let _ = writeln!(out, "{RULE}");
    out
}

pub fn print_run_summary(reports: &[BotReport]) {
    print!("{}", format_run_summary(reports));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionResult, ErrorRecord, PageAnalysis, ViewportSize};

    fn sample_report(fail: bool) -> BotReport {
        let mut report = BotReport::default();
        report.performance.insert("load_time".to_string(), 312.4);
        report.performance.insert("response_time".to_string(), 187.0);
        report.analysis = Some(PageAnalysis {
            title: "Example Domain".to_string(),
            url: "https://example.com/".to_string(),
            link_count: 1,
            form_count: 0,
            button_count: 0,
            input_count: 0,
            image_count: 0,
            has_service_worker: false,
            viewport: ViewportSize {
                width: 1366,
                height: 768,
            },
            scroll_height: 1024,
            links: vec![],
            forms: vec![],
        });
        report.record_action(ActionResult::success("SCROLL", "Scrolled to page middle"));
        if fail {
            report.record_error(ErrorRecord::action("click", "Element not found"));
        }
        report.finalize();
        report
    }

    #[test]
    fn test_format_report_success_layout() {
        let rendered = format_report(&sample_report(false));
        assert!(rendered.contains("TEST REPORT"));
        assert!(rendered.contains("Success: true"));
        assert!(rendered.contains("Actions: 1"));
        assert!(rendered.contains("Errors: 0"));
        assert!(rendered.contains("Load time: 312ms"));
        assert!(rendered.contains("Response time: 187ms"));
        assert!(rendered.contains("Title: Example Domain"));
        assert!(rendered.contains("1. SCROLL: SUCCESS"));
        assert!(!rendered.contains("Errors:\n"));
    }

    #[test]
    fn test_format_report_enumerates_errors() {
        let rendered = format_report(&sample_report(true));
        assert!(rendered.contains("Success: false"));
        assert!(rendered.contains("1. ACTION_ERROR: Element not found"));
    }

    #[test]
    fn test_format_run_summary_counts() {
        let reports = vec![sample_report(false), sample_report(true), sample_report(false)];
        let rendered = format_run_summary(&reports);
        assert!(rendered.contains("BOT #1 REPORT"));
        assert!(rendered.contains("BOT #3 REPORT"));
        assert!(rendered.contains("2/3 bots succeeded"));
    }

    #[test]
    fn test_format_run_summary_all_succeed() {
        let reports = vec![sample_report(false), sample_report(false), sample_report(false)];
        assert!(format_run_summary(&reports).contains("3/3 bots succeeded"));
    }

    #[test]
    fn test_format_update_analysis_extra_line() {
        let report = sample_report(false);
        let analysis = report.analysis.unwrap();
        let event = UpdateEvent::Analysis {
            message: "Page analyzed: 1 links, 0 forms".to_string(),
            analysis,
        };
        let rendered = format_update(2, &event);
        assert!(rendered.starts_with("[bot 2] [ANALYSIS]"));
        assert!(rendered.contains("analysis: 1 links, 0 forms"));
    }
}
