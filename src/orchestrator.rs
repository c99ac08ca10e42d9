//! Concurrent fan-out of independent bot runs.
//!
//! Each bot owns its own browser session and report; there is no shared
//! mutable state between runs and no cancellation when one run fails.

use std::sync::Arc;

use crate::bot::BotRunner;
use crate::config::BotConfig;
use crate::models::{BotReport, CustomAction, ErrorRecord, UpdateEvent};

/// Observer for progress events across concurrent runs. Receives the
/// 1-based bot index alongside each event.
pub type BotObserver = dyn Fn(usize, UpdateEvent) + Send + Sync;

/// Launch `count` independent bot runs against the same URL and wait for
/// all of them. Reports are returned in launch order regardless of
/// completion order. A panicked run yields a substitute failed report
/// rather than poisoning the batch.
pub async fn run_bots(
    url: &str,
    count: usize,
    config: &BotConfig,
    actions: &[CustomAction],
    observer: Option<Arc<BotObserver>>,
) -> Vec<BotReport> {
    let mut handles = Vec::with_capacity(count);

    for index in 1..=count {
        let url = url.to_string();
        let config = config.clone();
        let actions = actions.to_vec();
        let observer = observer.clone();

        handles.push(tokio::spawn(async move {
            let runner = BotRunner::new(config);
            match observer {
                Some(observer) => {
                    let callback = move |event: UpdateEvent| observer(index, event);
                    runner.run_test(&url, &actions, Some(&callback)).await
                }
                None => runner.run_test(&url, &actions, None).await,
            }
        }));
    }

    let mut reports = Vec::with_capacity(count);
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(error) => {
                tracing::error!("Bot {} task failed: {error}", index + 1);
                let mut report = BotReport::default();
                report.record_error(ErrorRecord::critical(format!("Bot task failed: {error}")));
                report.finalize();
                reports.push(report);
            }
        }
    }

    reports
}

/// Number of runs that completed without any recorded error.
pub fn success_count(reports: &[BotReport]) -> usize {
    reports.iter().filter(|report| report.success).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_count() {
        let mut ok = BotReport::default();
        ok.finalize();

        let mut failed = BotReport::default();
        failed.record_error(ErrorRecord::critical("Navigation failed"));
        failed.finalize();

        let mut ok2 = BotReport::default();
        ok2.finalize();

        let reports = vec![ok, failed, ok2];
        assert_eq!(success_count(&reports), 2);
    }

    #[test]
    fn test_success_count_empty() {
        assert_eq!(success_count(&[]), 0);
    }
}
