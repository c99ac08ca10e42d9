//! Bot run lifecycle: init, navigate, analyze, act, finalize, cleanup.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::browser::BrowserSession;
use crate::config::BotConfig;
use crate::models::{ActionResult, BotReport, CustomAction, ErrorRecord, UpdateEvent};

/// Fire-and-forget progress callback. Events are delivered after the
/// corresponding pipeline step completes; the return value is ignored.
pub type UpdateCallback = dyn Fn(UpdateEvent) + Send + Sync;

fn emit(observer: Option<&UpdateCallback>, event: UpdateEvent) {
    if let Some(observer) = observer {
        observer(event);
    }
}

/// Runs one complete test against a URL, owning a single browser session
/// for the duration of the run.
pub struct BotRunner {
    config: BotConfig,
}

impl BotRunner {
    pub fn new(config: BotConfig) -> Self {
        Self { config }
    }

    /// Execute the full run pipeline and return the accumulated report.
    ///
    /// Never propagates an error past this boundary: critical failures in
    /// any step become a `CRITICAL_ERROR` record in the returned report,
    /// and session teardown always runs.
    pub async fn run_test(
        &self,
        url: &str,
        actions: &[CustomAction],
        observer: Option<&UpdateCallback>,
    ) -> BotReport {
        let mut report = BotReport::default();

        let mut session = match BrowserSession::launch(&self.config).await {
            Ok(session) => session,
            Err(error) => {
                let message = format!("Browser initialization failed: {error:#}");
                tracing::error!("{message}");
                emit(
                    observer,
                    UpdateEvent::Error {
                        message: format!("Critical error: {error:#}"),
                    },
                );
                report.record_error(ErrorRecord::critical(message));
                report.finalize();
                return report;
            }
        };

        if let Err(error) = self.drive(&session, url, actions, &mut report, observer).await {
            emit(
                observer,
                UpdateEvent::Error {
                    message: format!("Critical error: {error:#}"),
                },
            );
            report.record_error(ErrorRecord::critical(format!("{error:#}")));
        }

        report.finalize();
        session.close().await;
        report
    }

    /// The critical portion of the pipeline. Any error returned here ends
    /// the run; action-level failures are absorbed into the report instead.
    async fn drive(
        &self,
        session: &BrowserSession,
        url: &str,
        actions: &[CustomAction],
        report: &mut BotReport,
        observer: Option<&UpdateCallback>,
    ) -> Result<()> {
        emit(
            observer,
            UpdateEvent::Status {
                message: "Bot started, navigating...".to_string(),
            },
        );

        let started = Instant::now();
        session.navigate(url).await?;
        let load_time = started.elapsed().as_secs_f64() * 1000.0;
        report.performance.insert("load_time".to_string(), load_time);

        if let Some(response_time) = session.response_timing_ms().await {
            report
                .performance
                .insert("response_time".to_string(), response_time);
        }

        emit(
            observer,
            UpdateEvent::Navigation {
                message: format!("Page loaded ({load_time:.0}ms)"),
                url: session.current_url().await.unwrap_or_else(|| url.to_string()),
            },
        );

        let analysis = session.analyze().await?;
        emit(
            observer,
            UpdateEvent::Analysis {
                message: format!(
                    "Page analyzed: {} links, {} forms",
                    analysis.link_count, analysis.form_count
                ),
                analysis: analysis.clone(),
            },
        );
        report.analysis = Some(analysis);

        self.automated_scroll(session, report, observer).await;

        for action in actions {
            self.perform_action(session, action, report, observer).await;
        }

        Ok(())
    }

    /// Built-in scripted action: scroll to the page midpoint and pause.
    /// Failures are recorded as non-fatal automation errors.
    async fn automated_scroll(
        &self,
        session: &BrowserSession,
        report: &mut BotReport,
        observer: Option<&UpdateCallback>,
    ) {
        let scroll = &self.config.testing.scroll;
        if !scroll.enabled {
            return;
        }

        let outcome = async {
            session.scroll_to_midpoint().await?;
            tokio::time::sleep(Duration::from_millis(scroll.wait_time_ms)).await;
            Ok::<_, anyhow::Error>(())
        }
        .await;

        match outcome {
            Ok(()) => {
                report.record_action(ActionResult::success("SCROLL", "Scrolled to page middle"));
                emit(
                    observer,
                    UpdateEvent::Action {
                        message: "Page scroll test successful".to_string(),
                    },
                );
            }
            Err(error) => {
                report.record_error(ErrorRecord::automation(format!("{error:#}")));
            }
        }
    }

    /// Execute one custom action. Each failure is recorded individually and
    /// never stops the remaining queue.
    async fn perform_action(
        &self,
        session: &BrowserSession,
        action: &CustomAction,
        report: &mut BotReport,
        observer: Option<&UpdateCallback>,
    ) {
        let outcome = match action {
            CustomAction::Click { selector } => session
                .click(selector)
                .await
                .map(|()| ActionResult::success("CUSTOM_CLICK", format!("Clicked {selector}"))),
            CustomAction::Type { selector, text } => session
                .type_text(selector, text)
                .await
                .map(|()| ActionResult::success("CUSTOM_TYPE", format!("Typed into {selector}"))),
            CustomAction::Wait { duration } => {
                tokio::time::sleep(Duration::from_millis(*duration)).await;
                Ok(ActionResult::success("WAIT", format!("Waited {duration}ms")))
            }
            CustomAction::Unsupported => {
                tracing::debug!("Skipping unsupported action kind");
                return;
            }
        };

        match outcome {
            Ok(result) => {
                report.record_action(result);
                emit(
                    observer,
                    UpdateEvent::Action {
                        message: format!("Custom action executed: {}", action.kind()),
                    },
                );
            }
            Err(error) => {
                report.record_error(ErrorRecord::action(action.kind(), format!("{error:#}")));
            }
        }
    }
}
