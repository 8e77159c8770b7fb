//! Hook event boundary: raw stdin JSON → validated event.
//!
//! The assistant delivers one JSON object per hook invocation. Unknown event
//! names and missing session ids are rejected here, before anything reaches
//! the reducer, so the reducer only ever sees well-formed input.

use serde::Deserialize;

use crate::error::TermdockError;

/// Raw hook payload as delivered on stdin. Every field is optional at the
/// wire level; validation happens in [`HookInput::to_event`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub hook_event_name: Option<String>,
    #[serde(default)]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
}

/// The fixed set of lifecycle events the reducer understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    Notification { notification_type: Option<String> },
    Stop,
    UserPromptSubmit,
}

/// Notification subtypes that mean the session is waiting on the user.
const PERMISSION_PROMPT_TYPES: &[&str] = &["permission_prompt", "elicitation_dialog"];

impl HookEvent {
    /// True for notifications that represent a permission/elicitation prompt.
    pub fn is_permission_prompt(&self) -> bool {
        match self {
            HookEvent::Notification { notification_type } => notification_type
                .as_deref()
                .is_some_and(|t| PERMISSION_PROMPT_TYPES.contains(&t)),
            _ => false,
        }
    }
}

impl HookInput {
    /// Parses a raw stdin payload.
    pub fn from_json(input: &str) -> Result<Self, TermdockError> {
        serde_json::from_str(input).map_err(TermdockError::InputMalformed)
    }

    /// Validates the payload into an event, rejecting unknown event names
    /// and missing/empty session ids.
    pub fn to_event(&self) -> Result<HookEvent, TermdockError> {
        if self.session_id.as_deref().unwrap_or("").is_empty() {
            return Err(TermdockError::MissingSessionId);
        }

        let name = self.hook_event_name.as_deref().unwrap_or("");
        match name {
            "PreToolUse" => Ok(HookEvent::PreToolUse),
            "PostToolUse" => Ok(HookEvent::PostToolUse),
            "Notification" => Ok(HookEvent::Notification {
                notification_type: self.notification_type.clone(),
            }),
            "Stop" => Ok(HookEvent::Stop),
            "UserPromptSubmit" => Ok(HookEvent::UserPromptSubmit),
            other => Err(TermdockError::UnknownEvent(other.to_string())),
        }
    }
}
