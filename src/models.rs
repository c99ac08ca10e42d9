//! Data models for bot test runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Outcome of a single executed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Success,
    Failure,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Success => write!(f, "SUCCESS"),
            ActionStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Result of one executed action, appended to the report and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Action kind (e.g., "SCROLL", "CUSTOM_CLICK", "WAIT")
    pub kind: String,
    pub status: ActionStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Optional extra detail for the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

impl ActionResult {
    pub fn success(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            status: ActionStatus::Success,
            message: message.into(),
            timestamp: Utc::now(),
            details: None,
        }
    }
}

/// Error severity/category for recorded run errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Aborts the remaining pipeline steps for the run
    CriticalError,
    /// Failure of the built-in automated action, non-fatal
    AutomationError,
    /// Failure of one custom action, non-fatal
    ActionError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::CriticalError => write!(f, "CRITICAL_ERROR"),
            ErrorKind::AutomationError => write!(f, "AUTOMATION_ERROR"),
            ErrorKind::ActionError => write!(f, "ACTION_ERROR"),
        }
    }
}

/// Structured error record collected in the report. Run errors are data;
/// nothing is thrown past the run boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    /// Offending action kind, for action-level errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::CriticalError,
            message: message.into(),
            action: None,
            timestamp: Utc::now(),
        }
    }

    pub fn automation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::AutomationError,
            message: message.into(),
            action: None,
            timestamp: Utc::now(),
        }
    }

    pub fn action(action: &str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ActionError,
            message: message.into(),
            action: Some(action.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// Viewport dimensions reported by the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

/// One anchor element on the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkDescriptor {
    pub text: String,
    pub href: String,
    #[serde(default)]
    pub target: String,
}

/// One input element inside a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormInput {
    #[serde(rename = "type", default)]
    pub input_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

/// One form element on the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDescriptor {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub inputs: Vec<FormInput>,
}

/// DOM metrics snapshot, deserialized straight from the in-page
/// evaluation payload (camelCase keys). Produced exactly once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub title: String,
    pub url: String,
    pub link_count: u32,
    pub form_count: u32,
    pub button_count: u32,
    pub input_count: u32,
    pub image_count: u32,
    pub has_service_worker: bool,
    pub viewport: ViewportSize,
    pub scroll_height: i64,
    #[serde(default)]
    pub links: Vec<LinkDescriptor>,
    #[serde(default)]
    pub forms: Vec<FormDescriptor>,
}

/// Complete result of one bot run.
#[derive(Debug, Default, Serialize)]
pub struct BotReport {
    pub success: bool,
    pub actions: Vec<ActionResult>,
    pub errors: Vec<ErrorRecord>,
    pub analysis: Option<PageAnalysis>,
    /// Metric name -> duration in milliseconds
    pub performance: HashMap<String, f64>,
}

impl BotReport {
    pub fn record_action(&mut self, action: ActionResult) {
        self.actions.push(action);
    }

    pub fn record_error(&mut self, error: ErrorRecord) {
        self.errors.push(error);
    }

    /// Compute the final success flag. A run succeeded iff its error list
    /// is empty at completion.
    pub fn finalize(&mut self) {
        self.success = self.errors.is_empty();
    }
}

fn default_wait_ms() -> u64 {
    1000
}

/// A caller-supplied action, dispatched after page analysis.
///
/// Unknown kinds deserialize into `Unsupported`, an explicit no-op branch:
/// it emits neither an action result nor an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CustomAction {
    Click {
        selector: String,
    },
    Type {
        selector: String,
        text: String,
    },
    Wait {
        /// Duration in milliseconds
        #[serde(default = "default_wait_ms")]
        duration: u64,
    },
    #[serde(other)]
    Unsupported,
}

impl CustomAction {
    pub fn kind(&self) -> &'static str {
        match self {
            CustomAction::Click { .. } => "click",
            CustomAction::Type { .. } => "type",
            CustomAction::Wait { .. } => "wait",
            CustomAction::Unsupported => "unsupported",
        }
    }
}

/// Progress event emitted to an optional observer after a pipeline step.
/// Purely informational; delivery has no effect on control flow.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UpdateEvent {
    Status { message: String },
    Navigation { message: String, url: String },
    Analysis { message: String, analysis: PageAnalysis },
    Action { message: String },
    Error { message: String },
}

impl UpdateEvent {
    pub fn label(&self) -> &'static str {
        match self {
            UpdateEvent::Status { .. } => "STATUS",
            UpdateEvent::Navigation { .. } => "NAVIGATION",
            UpdateEvent::Analysis { .. } => "ANALYSIS",
            UpdateEvent::Action { .. } => "ACTION",
            UpdateEvent::Error { .. } => "ERROR",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            UpdateEvent::Status { message }
            | UpdateEvent::Navigation { message, .. }
            | UpdateEvent::Analysis { message, .. }
            | UpdateEvent::Action { message }
            | UpdateEvent::Error { message } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_finalize_success_iff_no_errors() {
        let mut report = BotReport::default();
        report.record_action(ActionResult::success("SCROLL", "Scrolled to page middle"));
        report.finalize();
        assert!(report.success);

        report.record_error(ErrorRecord::action("click", "Element not found"));
        report.finalize();
        assert!(!report.success);
    }

    #[test]
    fn test_custom_action_click_deserialization() {
        let action: CustomAction =
            serde_json::from_value(json!({"type": "click", "selector": "#submit"})).unwrap();
        match action {
            CustomAction::Click { selector } => assert_eq!(selector, "#submit"),
            other => panic!("expected click, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_action_wait_default_duration() {
        let action: CustomAction = serde_json::from_value(json!({"type": "wait"})).unwrap();
        match action {
            CustomAction::Wait { duration } => assert_eq!(duration, 1000),
            other => panic!("expected wait, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_action_unknown_kind_is_unsupported() {
        let action: CustomAction =
            serde_json::from_value(json!({"type": "hover", "selector": "a"})).unwrap();
        assert!(matches!(action, CustomAction::Unsupported));
        assert_eq!(action.kind(), "unsupported");
    }

    #[test]
    fn test_custom_action_list_deserialization() {
        let actions: Vec<CustomAction> = serde_json::from_str(
            r##"[
                {"type": "click", "selector": "#go"},
                {"type": "type", "selector": "input[name=q]", "text": "hello"},
                {"type": "wait", "duration": 250}
            ]"##,
        )
        .unwrap();
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].kind(), "click");
        assert_eq!(actions[1].kind(), "type");
        assert_eq!(actions[2].kind(), "wait");
    }

    #[test]
    fn test_page_analysis_from_evaluation_payload() {
        let payload = json!({
            "title": "Example Domain",
            "url": "https://example.com/",
            "linkCount": 1,
            "formCount": 0,
            "buttonCount": 0,
            "inputCount": 0,
            "imageCount": 0,
            "hasServiceWorker": false,
            "viewport": {"width": 1366, "height": 768},
            "scrollHeight": 1024,
            "links": [{"text": "More information...", "href": "https://iana.org/", "target": ""}],
            "forms": []
        });

        let analysis: PageAnalysis = serde_json::from_value(payload).unwrap();
        assert_eq!(analysis.title, "Example Domain");
        assert_eq!(analysis.link_count, 1);
        assert_eq!(analysis.viewport.width, 1366);
        assert_eq!(analysis.links.len(), 1);
        assert_eq!(analysis.links[0].href, "https://iana.org/");
    }

    #[test]
    fn test_form_input_type_field_rename() {
        let input: FormInput =
            serde_json::from_value(json!({"type": "email", "name": "user", "required": true}))
                .unwrap();
        assert_eq!(input.input_type, "email");
        assert!(input.required);
    }

    #[test]
    fn test_error_record_constructors() {
        let critical = ErrorRecord::critical("Browser initialization failed");
        assert_eq!(critical.kind, ErrorKind::CriticalError);
        assert!(critical.action.is_none());

        let action = ErrorRecord::action("type", "Element not found");
        assert_eq!(action.kind, ErrorKind::ActionError);
        assert_eq!(action.action.as_deref(), Some("type"));
    }

    #[test]
    fn test_update_event_label_and_message() {
        let event = UpdateEvent::Status {
            message: "Bot started, navigating...".to_string(),
        };
        assert_eq!(event.label(), "STATUS");
        assert_eq!(event.message(), "Bot started, navigating...");
    }
}
