//! Generation parameters, validation, and prompt construction.
//!
//! The provider accepts a single free-text prompt with a hard length limit.
//! [`build_prompt`] turns structured [`GenerationParams`] into that prompt:
//! a caller-supplied prompt is used verbatim with a compact parameter
//! summary appended, otherwise a descriptive prompt is synthesized. The
//! result is always truncated to the provider maximum.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Provider-documented maximum prompt length, in characters.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 400;

/// Slowest accepted tempo.
pub const MIN_TEMPO_BPM: u16 = 20;

/// Fastest accepted tempo.
pub const MAX_TEMPO_BPM: u16 = 300;

/// Upper bound on the instrument list.
pub const MAX_INSTRUMENTS: usize = 8;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What kind of piece the provider should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Instruments only, no vocals.
    InstrumentalOnly,
    /// Vocals accompanied by instruments.
    Vocal,
    /// Unaccompanied vocals.
    VocalOnly,
}

impl GenerationMode {
    /// Whether the provider should be asked for an instrumental track.
    pub fn is_instrumental(self) -> bool {
        matches!(self, Self::InstrumentalOnly)
    }

    /// Phrase used when synthesizing a descriptive prompt.
    fn phrase(self) -> &'static str {
        match self {
            Self::InstrumentalOnly => "instrumental",
            Self::Vocal => "vocal",
            Self::VocalOnly => "a cappella vocal",
        }
    }
}

/// Structured input to a generation request.
///
/// `scale` and `cycle` are the melodic framework (raga) and rhythmic cycle
/// (tala) selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub mode: GenerationMode,
    pub scale: String,
    pub cycle: String,
    #[serde(default)]
    pub instruments: Vec<String>,
    pub tempo: u16,
    pub mood: String,
    /// Free-text prompt. When present it is used verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Voice hint (e.g. "female", "baritone"). Ignored for instrumental mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Lyric language hint. Ignored for instrumental mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl GenerationParams {
    /// The custom prompt exactly as supplied, unless it is blank.
    pub fn custom_prompt(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|p| !p.trim().is_empty())
    }

    fn voice_hint(&self) -> Option<&str> {
        if self.mode.is_instrumental() {
            return None;
        }
        non_blank(self.voice.as_deref())
    }

    fn language_hint(&self) -> Option<&str> {
        if self.mode.is_instrumental() {
            return None;
        }
        non_blank(self.language.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate generation parameters before anything is sent to the provider.
pub fn validate_params(params: &GenerationParams) -> Result<(), CoreError> {
    if params.scale.trim().is_empty() {
        return Err(CoreError::Validation("scale must not be empty".into()));
    }
    if params.cycle.trim().is_empty() {
        return Err(CoreError::Validation("cycle must not be empty".into()));
    }
    if params.mood.trim().is_empty() {
        return Err(CoreError::Validation("mood must not be empty".into()));
    }
    if !(MIN_TEMPO_BPM..=MAX_TEMPO_BPM).contains(&params.tempo) {
        return Err(CoreError::Validation(format!(
            "tempo must be between {MIN_TEMPO_BPM} and {MAX_TEMPO_BPM} BPM, got {}",
            params.tempo
        )));
    }
    if params.instruments.len() > MAX_INSTRUMENTS {
        return Err(CoreError::Validation(format!(
            "at most {MAX_INSTRUMENTS} instruments are allowed, got {}",
            params.instruments.len()
        )));
    }
    if params.instruments.iter().any(|i| i.trim().is_empty()) {
        return Err(CoreError::Validation(
            "instrument names must not be empty".into(),
        ));
    }
    if params.mode.is_instrumental() && params.instruments.is_empty() {
        return Err(CoreError::Validation(
            "instrumental_only mode requires at least one instrument".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Prompt construction
// ---------------------------------------------------------------------------

/// Build the final provider prompt, truncated to `max_chars` characters.
pub fn build_prompt(params: &GenerationParams, max_chars: usize) -> String {
    let prompt = match params.custom_prompt() {
        Some(custom) => format!("{custom} [{}]", parameter_summary(params)),
        None => synthesize_prompt(params),
    };
    truncate_chars(&prompt, max_chars).to_string()
}

/// Compact `key: value` summary appended to custom prompts.
///
/// ```text
/// Raga: Yaman; Tala: Teental; Instruments: sitar, tabla; Tempo: 90 BPM; Mood: calm
/// ```
pub fn parameter_summary(params: &GenerationParams) -> String {
    let mut parts = vec![
        format!("Raga: {}", title_case(params.scale.trim())),
        format!("Tala: {}", title_case(params.cycle.trim())),
    ];
    if !params.instruments.is_empty() {
        parts.push(format!("Instruments: {}", trimmed(&params.instruments).join(", ")));
    }
    parts.push(format!("Tempo: {} BPM", params.tempo));
    parts.push(format!("Mood: {}", params.mood.trim()));
    if let Some(voice) = params.voice_hint() {
        parts.push(format!("Voice: {voice}"));
    }
    if let Some(language) = params.language_hint() {
        parts.push(format!("Language: {language}"));
    }
    parts.join("; ")
}

/// Descriptive prompt synthesized from the structured fields.
pub fn synthesize_prompt(params: &GenerationParams) -> String {
    let mut prompt = format!(
        "{} {} Indian classical piece in Raga {} set to {}",
        capitalize(params.mood.trim()),
        params.mode.phrase(),
        title_case(params.scale.trim()),
        title_case(params.cycle.trim()),
    );
    if !params.instruments.is_empty() {
        prompt.push_str(", featuring ");
        prompt.push_str(&join_natural(&trimmed(&params.instruments)));
    }
    prompt.push_str(&format!(", at {} BPM", params.tempo));
    match (params.voice_hint(), params.language_hint()) {
        (Some(voice), Some(language)) => {
            prompt.push_str(&format!(", with {voice} vocals sung in {language}"));
        }
        (Some(voice), None) => prompt.push_str(&format!(", with {voice} vocals")),
        (None, Some(language)) => prompt.push_str(&format!(", sung in {language}")),
        (None, None) => {}
    }
    prompt.push('.');
    prompt
}

/// Truncate `s` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn trimmed(items: &[String]) -> Vec<&str> {
    items.iter().map(|s| s.trim()).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title_case(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `["a"]` -> `a`, `["a", "b"]` -> `a and b`, `["a", "b", "c"]` -> `a, b and c`.
fn join_natural(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
