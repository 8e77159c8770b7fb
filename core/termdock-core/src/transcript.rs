//! Best-effort extraction of the last assistant message from a transcript.
//!
//! Transcripts are JSONL; each line is an event object. We scan from the end
//! for the newest assistant entry carrying text content. Any miss (absent
//! file, unreadable line, no assistant text) yields `None` and the caller
//! carries the previous cached message forward.

use std::path::Path;

use fs_err as fs;
use serde_json::Value;

/// Longest summary we cache on a session record.
const MAX_MESSAGE_LEN: usize = 200;

pub fn last_assistant_message(transcript_path: &Path) -> Option<String> {
    let content = fs::read_to_string(transcript_path).ok()?;

    for line in content.lines().rev() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(entry) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if entry.get("type").and_then(Value::as_str) != Some("assistant") {
            continue;
        }
        if let Some(text) = message_text(&entry) {
            return Some(truncate(&text));
        }
    }
    None
}

/// Pulls the first text block out of an assistant entry's message content.
fn message_text(entry: &Value) -> Option<String> {
    let content = entry.get("message")?.get("content")?;

    // Content is either a plain string or an array of typed blocks.
    if let Some(text) = content.as_str() {
        let text = text.trim();
        return (!text.is_empty()).then(|| text.to_string());
    }

    content.as_array()?.iter().find_map(|block| {
        if block.get("type").and_then(Value::as_str) != Some("text") {
            return None;
        }
        let text = block.get("text")?.as_str()?.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_LEN {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_MESSAGE_LEN).collect();
        format!("{}…", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn transcript(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_missing_file_yields_none() {
        assert_eq!(
            last_assistant_message(Path::new("/nonexistent/transcript.jsonl")),
            None
        );
    }

    #[test]
    fn test_finds_newest_assistant_text() {
        let file = transcript(&[
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"old reply"}]}}"#,
            r#"{"type":"user","message":{"content":"run the tests"}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Bash"},{"type":"text","text":"Tests pass."}]}}"#,
        ]);
        assert_eq!(
            last_assistant_message(file.path()).as_deref(),
            Some("Tests pass.")
        );
    }

    #[test]
    fn test_string_content_is_accepted() {
        let file = transcript(&[r#"{"type":"assistant","message":{"content":"plain text"}}"#]);
        assert_eq!(
            last_assistant_message(file.path()).as_deref(),
            Some("plain text")
        );
    }

    #[test]
    fn test_garbage_lines_are_skipped() {
        let file = transcript(&[
            r#"{"type":"assistant","message":{"content":"earlier"}}"#,
            "not json at all",
            r#"{"type":"assistant"}"#,
        ]);
        assert_eq!(
            last_assistant_message(file.path()).as_deref(),
            Some("earlier")
        );
    }

    #[test]
    fn test_no_assistant_entries_yields_none() {
        let file = transcript(&[r#"{"type":"user","message":{"content":"hello"}}"#]);
        assert_eq!(last_assistant_message(file.path()), None);
    }

    #[test]
    fn test_long_messages_are_truncated() {
        let long = "x".repeat(500);
        let line = format!(
            r#"{{"type":"assistant","message":{{"content":"{}"}}}}"#,
            long
        );
        let file = transcript(&[&line]);
        let message = last_assistant_message(file.path()).unwrap();
        assert!(message.chars().count() <= MAX_MESSAGE_LEN + 1);
        assert!(message.ends_with('…'));
    }
}
