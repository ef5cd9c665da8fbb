//! Parsing of provider status-endpoint responses.
//!
//! Unlike callbacks, status bodies carry an explicit status string, which
//! takes precedence over structural detection. Free-text messages are
//! ignored here: a status body's `msg` describes the HTTP call, not the job.

use serde_json::Value;

use crate::callback::{detect_shape, normalize, ProviderSignal};

/// The provider's own view of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    Pending,
    Processing,
    Complete,
    Failed,
    Unknown,
}

impl RemoteState {
    /// Classify a raw status string (case-insensitive).
    pub fn classify(raw: &str) -> Self {
        let s = raw.trim().to_ascii_lowercase();
        match s.as_str() {
            "success" | "succeeded" | "complete" | "completed" | "done" | "finished" => {
                Self::Complete
            }
            "failed" | "failure" | "error" | "cancelled" | "canceled" => Self::Failed,
            "pending" | "queued" | "submitted" | "waiting" | "created" => Self::Pending,
            "processing" | "running" | "in_progress" | "generating" | "text_success"
            | "first_success" => Self::Processing,
            _ if s.ends_with("_failed") || s.ends_with("_error") || s.contains("exception") => {
                Self::Failed
            }
            _ => Self::Unknown,
        }
    }
}

/// Raw status string from `data.status`, `status`, `data.state` or `state`.
pub fn status_string(body: &Value) -> Option<&str> {
    let data = body.get("data");
    [
        data.and_then(|d| d.get("status")),
        body.get("status"),
        data.and_then(|d| d.get("state")),
        body.get("state"),
    ]
    .into_iter()
    .flatten()
    .find_map(Value::as_str)
}

/// Reduce a status body to a signal.
pub fn parse_status_response(body: &Value) -> ProviderSignal {
    let raw = status_string(body);
    let state = raw.map(RemoteState::classify).unwrap_or(RemoteState::Unknown);

    match state {
        RemoteState::Failed => ProviderSignal::Failed {
            reason: error_message(body)
                .unwrap_or_else(|| format!("provider status {}", raw.unwrap_or("failed"))),
        },
        RemoteState::Complete => match artifact_signal(body) {
            Some(completed) => completed,
            None => ProviderSignal::Ambiguous {
                detail: format!(
                    "status {} without a usable artifact URL",
                    raw.unwrap_or("complete")
                ),
            },
        },
        RemoteState::Processing => ProviderSignal::Progress,
        RemoteState::Pending => ProviderSignal::Waiting,
        RemoteState::Unknown => artifact_signal(body).unwrap_or(ProviderSignal::Waiting),
    }
}

fn artifact_signal(body: &Value) -> Option<ProviderSignal> {
    let shape = detect_shape(body);
    if !shape.carries_artifact_slot() {
        return None;
    }
    match normalize(&shape, false).signal() {
        completed @ ProviderSignal::Completed { .. } => Some(completed),
        _ => None,
    }
}

fn error_message(body: &Value) -> Option<String> {
    let data = body.get("data");
    ["errorMessage", "error_message", "error"]
        .iter()
        .flat_map(|k| [data.and_then(|d| d.get(*k)), body.get(*k)])
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn status_strings_classify() {
        assert_eq!(RemoteState::classify("SUCCESS"), RemoteState::Complete);
        assert_eq!(RemoteState::classify("complete"), RemoteState::Complete);
        assert_eq!(RemoteState::classify("GENERATE_AUDIO_FAILED"), RemoteState::Failed);
        assert_eq!(RemoteState::classify("SENSITIVE_WORD_ERROR"), RemoteState::Failed);
        assert_eq!(RemoteState::classify("CALLBACK_EXCEPTION"), RemoteState::Failed);
        assert_eq!(RemoteState::classify("PENDING"), RemoteState::Pending);
        assert_eq!(RemoteState::classify("TEXT_SUCCESS"), RemoteState::Processing);
        assert_eq!(RemoteState::classify("mystery"), RemoteState::Unknown);
    }

    #[test]
    fn success_with_url_completes() {
        let body = json!({
            "code": 200,
            "msg": "success",
            "data": {
                "taskId": "abc123",
                "status": "SUCCESS",
                "response": {"sunoData": [{"audioUrl": "https://cdn/x.mp3", "title": "Bhairav"}]}
            }
        });
        assert_matches!(parse_status_response(&body), ProviderSignal::Completed { primary_url, .. } => {
            assert_eq!(primary_url, "https://cdn/x.mp3");
        });
    }

    #[test]
    fn success_without_url_is_ambiguous() {
        let body = json!({"data": {"status": "SUCCESS", "response": {"sunoData": [{"audioUrl": ""}]}}});
        assert_matches!(parse_status_response(&body), ProviderSignal::Ambiguous { .. });
    }

    #[test]
    fn pending_body_with_success_message_is_waiting() {
        let body = json!({"code": 200, "msg": "success", "data": {"status": "PENDING", "response": null}});
        assert_eq!(parse_status_response(&body), ProviderSignal::Waiting);
    }

    #[test]
    fn failed_status_carries_error_message() {
        let body = json!({"data": {"status": "CREATE_TASK_FAILED", "errorMessage": "quota exhausted"}});
        assert_matches!(parse_status_response(&body), ProviderSignal::Failed { reason } => {
            assert_eq!(reason, "quota exhausted");
        });
    }

    #[test]
    fn running_status_is_progress() {
        let body = json!({"status": "processing"});
        assert_eq!(parse_status_response(&body), ProviderSignal::Progress);
    }

    #[test]
    fn missing_status_trusts_artifact_url() {
        let body = json!({"audio_url": "https://cdn/x.mp3"});
        assert_matches!(parse_status_response(&body), ProviderSignal::Completed { .. });
    }
}
