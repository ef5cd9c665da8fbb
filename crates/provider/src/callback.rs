//! Provider callback payloads and their normalization.
//!
//! The provider's webhook bodies do not carry a reliable type tag, so the
//! shape is detected structurally, in a fixed priority order, into a
//! [`CallbackShape`]. Each shape is then normalized into a
//! [`NormalizedCallback`], which reduces to a single [`ProviderSignal`].
//!
//! Stream URLs (`stream_audio_url`) are never treated as artifacts: a
//! stream is not a finished file.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

pub use crate::api::extract_task_id;

/// Keys holding the artifact URL inside an `audio_list` item.
const AUDIO_LIST_URL_KEYS: &[&str] = &["audio_url", "audioUrl"];

/// Keys holding the artifact URL inside a nested result object.
const RESULT_URL_KEYS: &[&str] = &["audio_url", "audioUrl", "source_audio_url", "sourceAudioUrl"];

/// Keys holding a top-level artifact URL.
const DIRECT_URL_KEYS: &[&str] = &["audio_url", "audioUrl"];

/// Paths that may hold a nested array of result objects.
const RESULT_ARRAY_PATHS: &[&[&str]] = &[
    &["data", "data"],
    &["data", "response", "data"],
    &["data", "response", "sunoData"],
];

/// Keys holding a free-text status message.
const MESSAGE_KEYS: &[&str] = &["msg", "message", "status_message"];

/// Callback types and status strings meaning "started, not done".
const PROGRESS_MARKERS: &[&str] = &[
    "text",
    "first",
    "processing",
    "running",
    "in_progress",
    "generating",
    "text_success",
    "first_success",
];

static FAILURE_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(fail\w*|error\w*)\b").expect("valid regex"));

static SUCCESS_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(success\w*|succeeded|complete[ds]?)\b").expect("valid regex")
});

/// One artifact candidate. `url` is `None` when missing or blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioItem {
    pub url: Option<String>,
    pub title: Option<String>,
}

/// Structurally detected callback shape, in detection priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackShape {
    /// `code >= 400` or `callbackType: "error"`.
    ErrorReport { code: Option<i64>, message: String },
    /// `data.audio_list: [{audio_url, title}]`.
    AudioList(Vec<AudioItem>),
    /// A nested array of generic result objects; the first item decides.
    ResultArray(Vec<AudioItem>),
    /// A top-level `audio_url` / `audioUrl` field.
    DirectUrl(AudioItem),
    /// Nothing but a free-text message.
    StatusMessage(String),
    Unrecognized,
}

impl CallbackShape {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ErrorReport { .. } => "error_report",
            Self::AudioList(_) => "audio_list",
            Self::ResultArray(_) => "result_array",
            Self::DirectUrl(_) => "direct_url",
            Self::StatusMessage(_) => "status_message",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Whether the shape has a slot where a finished artifact URL belongs.
    pub fn carries_artifact_slot(&self) -> bool {
        matches!(
            self,
            Self::AudioList(_) | Self::ResultArray(_) | Self::DirectUrl(_)
        )
    }
}

/// A callback reduced to the fields reconciliation cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCallback {
    pub shape: &'static str,
    pub is_complete: bool,
    pub primary_artifact_url: Option<String>,
    pub all_artifact_urls: Vec<String>,
    pub title: Option<String>,
    pub is_failure: bool,
    pub failure_reason: Option<String>,
    /// The payload explicitly says work has started.
    pub is_progress: bool,
    /// The outcome was inferred from free text, not structure.
    pub heuristic: bool,
    /// The shape had an artifact slot, filled or not.
    pub has_artifact_slot: bool,
}

/// What a callback or status response means for the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSignal {
    Completed {
        primary_url: String,
        all_urls: Vec<String>,
        title: Option<String>,
    },
    Failed {
        reason: String,
    },
    /// Work has started; the record may move to processing.
    Progress,
    /// Looks complete but carries no usable artifact URL.
    Ambiguous {
        detail: String,
    },
    /// Recognized, but nothing new.
    Waiting,
    Unrecognized,
}

impl ProviderSignal {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Progress => "progress",
            Self::Ambiguous { .. } => "ambiguous",
            Self::Waiting => "waiting",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl NormalizedCallback {
    pub fn is_unrecognized(&self) -> bool {
        self.shape == CallbackShape::Unrecognized.name()
    }

    /// Collapse into a single signal. Failure wins over everything, and a
    /// filled artifact slot wins over progress markers.
    pub fn signal(&self) -> ProviderSignal {
        if self.is_failure {
            return ProviderSignal::Failed {
                reason: self
                    .failure_reason
                    .clone()
                    .unwrap_or_else(|| "provider reported failure".to_string()),
            };
        }
        if let (true, Some(url)) = (self.is_complete, &self.primary_artifact_url) {
            return ProviderSignal::Completed {
                primary_url: url.clone(),
                all_urls: self.all_artifact_urls.clone(),
                title: self.title.clone(),
            };
        }
        if self.is_complete || self.has_artifact_slot {
            return ProviderSignal::Ambiguous {
                detail: format!("{} payload without a usable artifact URL", self.shape),
            };
        }
        if self.is_progress {
            return ProviderSignal::Progress;
        }
        if self.is_unrecognized() {
            ProviderSignal::Unrecognized
        } else {
            ProviderSignal::Waiting
        }
    }
}

/// Detect the payload shape.
pub fn detect_shape(payload: &Value) -> CallbackShape {
    if let Some(report) = error_report(payload) {
        return report;
    }

    let data = payload.get("data");

    let audio_list = data
        .and_then(|d| d.get("audio_list"))
        .or_else(|| payload.get("audio_list"))
        .and_then(Value::as_array);
    if let Some(items) = audio_list {
        return CallbackShape::AudioList(
            items.iter().map(|i| audio_item(i, AUDIO_LIST_URL_KEYS)).collect(),
        );
    }

    let result_array = RESULT_ARRAY_PATHS
        .iter()
        .find_map(|path| lookup(payload, path).and_then(Value::as_array))
        .or_else(|| data.and_then(Value::as_array));
    if let Some(items) = result_array {
        return CallbackShape::ResultArray(
            items.iter().map(|i| audio_item(i, RESULT_URL_KEYS)).collect(),
        );
    }

    let direct = [Some(payload), data]
        .into_iter()
        .flatten()
        .find(|obj| DIRECT_URL_KEYS.iter().any(|k| obj.get(*k).is_some()));
    if let Some(obj) = direct {
        return CallbackShape::DirectUrl(audio_item(obj, DIRECT_URL_KEYS));
    }

    if let Some(message) = first_string(payload, data, MESSAGE_KEYS) {
        return CallbackShape::StatusMessage(message);
    }

    CallbackShape::Unrecognized
}

/// Detect and normalize a callback payload.
pub fn parse_callback(payload: &Value) -> NormalizedCallback {
    let shape = detect_shape(payload);
    normalize(&shape, is_progress_payload(payload))
}

/// Normalize an already detected shape.
pub fn normalize(shape: &CallbackShape, is_progress: bool) -> NormalizedCallback {
    let mut out = NormalizedCallback {
        shape: shape.name(),
        is_complete: false,
        primary_artifact_url: None,
        all_artifact_urls: Vec::new(),
        title: None,
        is_failure: false,
        failure_reason: None,
        is_progress,
        heuristic: false,
        has_artifact_slot: shape.carries_artifact_slot(),
    };

    match shape {
        CallbackShape::ErrorReport { code, message } => {
            out.is_failure = true;
            out.failure_reason = Some(match code {
                Some(code) => format!("provider error {code}: {message}"),
                None => message.clone(),
            });
        }
        CallbackShape::AudioList(items) => {
            let first = items.iter().find(|i| i.url.is_some());
            out.primary_artifact_url = first.and_then(|i| i.url.clone());
            out.title = first.and_then(|i| i.title.clone());
            out.all_artifact_urls = items.iter().filter_map(|i| i.url.clone()).collect();
            out.is_complete = out.primary_artifact_url.is_some();
        }
        CallbackShape::ResultArray(items) => {
            if let Some(first) = items.first() {
                out.primary_artifact_url = first.url.clone();
                out.title = first.title.clone();
            }
            out.all_artifact_urls = items.iter().filter_map(|i| i.url.clone()).collect();
            out.is_complete = out.primary_artifact_url.is_some();
        }
        CallbackShape::DirectUrl(item) => {
            out.primary_artifact_url = item.url.clone();
            out.title = item.title.clone();
            out.all_artifact_urls = item.url.iter().cloned().collect();
            out.is_complete = out.primary_artifact_url.is_some();
        }
        CallbackShape::StatusMessage(message) => {
            if FAILURE_WORDS.is_match(message) {
                out.is_failure = true;
                out.failure_reason = Some(message.clone());
                out.heuristic = true;
            } else if SUCCESS_WORDS.is_match(message) {
                out.is_complete = true;
                out.heuristic = true;
            }
            if out.heuristic {
                tracing::warn!(
                    message = %message,
                    failure = out.is_failure,
                    "Callback outcome inferred from message text",
                );
            }
        }
        CallbackShape::Unrecognized => {}
    }

    out
}

/// Whether `callbackType` or `status` names an in-progress stage.
pub fn is_progress_payload(payload: &Value) -> bool {
    let data = payload.get("data");
    ["callbackType", "callback_type", "status"]
        .iter()
        .flat_map(|key| [data.and_then(|d| d.get(*key)), payload.get(*key)])
        .flatten()
        .filter_map(Value::as_str)
        .any(|marker| {
            PROGRESS_MARKERS
                .iter()
                .any(|known| marker.eq_ignore_ascii_case(known))
        })
}

fn error_report(payload: &Value) -> Option<CallbackShape> {
    let data = payload.get("data");
    let code = payload
        .get("code")
        .or_else(|| data.and_then(|d| d.get("code")))
        .and_then(Value::as_i64);
    let error_type = [data.and_then(|d| d.get("callbackType")), payload.get("callbackType")]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .any(|t| t.eq_ignore_ascii_case("error"));

    if !error_type && !code.is_some_and(|c| c >= 400) {
        return None;
    }
    let message = first_string(payload, data, &["errorMessage", "error_message", "msg", "message"])
        .unwrap_or_else(|| "provider reported an error".to_string());
    Some(CallbackShape::ErrorReport { code, message })
}

fn audio_item(value: &Value, url_keys: &[&str]) -> AudioItem {
    AudioItem {
        url: url_keys
            .iter()
            .filter_map(|k| value.get(*k).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(String::from),
        title: value
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
    }
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(*key))
}

fn first_string(payload: &Value, data: Option<&Value>, keys: &[&str]) -> Option<String> {
    [Some(payload), data]
        .into_iter()
        .flatten()
        .flat_map(|obj| keys.iter().filter_map(move |k| obj.get(*k)))
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
    fn audio_list_with_url_completes() {
        let payload = json!({
            "task_id": "abc123",
            "data": {"audio_list": [{"audio_url": "https://cdn/x.mp3", "title": "Yaman"}]}
        });
        let signal = parse_callback(&payload).signal();
        assert_matches!(signal, ProviderSignal::Completed { primary_url, title, .. } => {
            assert_eq!(primary_url, "https://cdn/x.mp3");
            assert_eq!(title.as_deref(), Some("Yaman"));
        });
    }

    #[test]
    fn audio_list_with_empty_url_is_ambiguous() {
        let payload = json!({"data": {"audio_list": [{"audio_url": ""}]}});
        let normalized = parse_callback(&payload);
        assert!(!normalized.is_complete);
        assert!(normalized.primary_artifact_url.is_none());
        assert_matches!(normalized.signal(), ProviderSignal::Ambiguous { .. });
    }

    #[test]
    fn audio_list_skips_blank_items() {
        let payload = json!({"data": {"audio_list": [
            {"audio_url": ""},
            {"audio_url": "https://cdn/b.mp3"}
        ]}});
        let normalized = parse_callback(&payload);
        assert_eq!(normalized.primary_artifact_url.as_deref(), Some("https://cdn/b.mp3"));
        assert_eq!(normalized.all_artifact_urls, vec!["https://cdn/b.mp3"]);
    }

    #[test]
    fn stream_url_never_counts_as_artifact() {
        let payload = json!({
            "code": 200,
            "msg": "First audio generated.",
            "data": {
                "callbackType": "first",
                "task_id": "abc123",
                "data": [{"audio_url": "", "stream_audio_url": "https://cdn/stream"}]
            }
        });
        let normalized = parse_callback(&payload);
        assert!(normalized.primary_artifact_url.is_none());
        assert_matches!(normalized.signal(), ProviderSignal::Ambiguous { .. });
    }

    #[test]
    fn result_array_uses_first_item() {
        let payload = json!({
            "code": 200,
            "msg": "All generated successfully.",
            "data": {
                "callbackType": "complete",
                "task_id": "abc123",
                "data": [
                    {"source_audio_url": "https://cdn/1.mp3", "title": "One"},
                    {"audio_url": "https://cdn/2.mp3", "title": "Two"}
                ]
            }
        });
        let normalized = parse_callback(&payload);
        assert_eq!(normalized.shape, "result_array");
        assert_eq!(normalized.primary_artifact_url.as_deref(), Some("https://cdn/1.mp3"));
        assert_eq!(normalized.all_artifact_urls.len(), 2);
        assert_eq!(normalized.title.as_deref(), Some("One"));
    }

    #[test]
    fn direct_url_completes() {
        let payload = json!({"task_id": "abc123", "audioUrl": "https://cdn/x.mp3"});
        assert_matches!(parse_callback(&payload).signal(), ProviderSignal::Completed { .. });
    }

    #[test]
    fn direct_empty_url_is_ambiguous() {
        let payload = json!({"task_id": "abc123", "audio_url": "  "});
        assert_matches!(parse_callback(&payload).signal(), ProviderSignal::Ambiguous { .. });
    }

    #[test]
    fn failure_message_is_detected_heuristically() {
        let payload = json!({"task_id": "abc123", "msg": "Generation failed: content policy"});
        let normalized = parse_callback(&payload);
        assert!(normalized.heuristic);
        assert_matches!(normalized.signal(), ProviderSignal::Failed { reason } => {
            assert!(reason.contains("content policy"));
        });
    }

    #[test]
    fn success_message_without_url_is_ambiguous() {
        let payload = json!({"task_id": "abc123", "message": "Task completed"});
        let normalized = parse_callback(&payload);
        assert!(normalized.is_complete);
        assert!(normalized.primary_artifact_url.is_none());
        assert_matches!(normalized.signal(), ProviderSignal::Ambiguous { .. });
    }

    #[test]
    fn structured_error_wins_over_artifact_shapes() {
        let payload = json!({
            "code": 531,
            "msg": "Generation failed",
            "data": {"callbackType": "error", "task_id": "abc123", "data": []}
        });
        let normalized = parse_callback(&payload);
        assert!(!normalized.heuristic);
        assert_matches!(normalized.signal(), ProviderSignal::Failed { reason } => {
            assert!(reason.contains("531"));
        });
    }

    #[test]
    fn text_stage_callback_is_progress() {
        let payload = json!({"code": 200, "data": {"callbackType": "text", "task_id": "abc123"}});
        assert_matches!(parse_callback(&payload).signal(), ProviderSignal::Progress);
    }

    #[test]
    fn neutral_message_is_waiting() {
        let payload = json!({"task_id": "abc123", "msg": "queued"});
        assert_eq!(parse_callback(&payload).signal(), ProviderSignal::Waiting);
    }

    #[test]
    fn unknown_payload_is_unrecognized() {
        let payload = json!({"task_id": "abc123", "foo": 1});
        assert_eq!(parse_callback(&payload).signal(), ProviderSignal::Unrecognized);
    }

    #[test]
    fn webhook_task_id_lookup_order() {
        let payload = json!({"task_id": "outer", "data": {"taskId": "inner"}});
        assert_eq!(extract_task_id(&payload).as_deref(), Some("inner"));
    }
}
