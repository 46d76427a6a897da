//! Plain-text transcript download.
//!
//! Format: the header line, a blank line, then `"<Speaker>: <message>\n\n"` per entry.

use crate::history::{ChatEntry, Role};
use anyhow::Result;
use std::fmt;

pub const TRANSCRIPT_HEADER: &str = "Study Buddy Chat Transcript";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    You,
    Astra,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::You => "You",
            Speaker::Astra => "Astra",
        }
    }

    fn prefix(&self) -> String {
        format!("{}: ", self.as_str())
    }
}

impl From<Role> for Speaker {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Speaker::You,
            Role::Bot => Speaker::Astra,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn export_transcript(entries: &[ChatEntry]) -> String {
    let mut out = format!("{TRANSCRIPT_HEADER}\n\n");
    for entry in entries {
        out.push_str(&format!("{}: {}\n\n", Speaker::from(entry.role), entry.text));
    }
    out
}

/// Recover `(speaker, message)` pairs from an exported transcript.
///
/// A blank line followed by something other than a speaker prefix is part of the
/// previous message.
pub fn parse_transcript(text: &str) -> Result<Vec<(Speaker, String)>> {
    let Some(body) = text.strip_prefix(TRANSCRIPT_HEADER) else {
        anyhow::bail!("Not a transcript: missing '{}' header", TRANSCRIPT_HEADER);
    };
    let body = body.strip_prefix("\n\n").unwrap_or(body.trim_start_matches('\n'));
    let body = body.strip_suffix("\n\n").unwrap_or(body);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<(Speaker, String)> = Vec::new();
    for chunk in body.split("\n\n") {
        match speaker_line(chunk) {
            Some((speaker, message)) => entries.push((speaker, message.to_string())),
            None => match entries.last_mut() {
                Some((_, message)) => {
                    message.push_str("\n\n");
                    message.push_str(chunk);
                }
                None => anyhow::bail!("Transcript entry without a speaker: {:?}", chunk),
            },
        }
    }
    Ok(entries)
}

fn speaker_line(chunk: &str) -> Option<(Speaker, &str)> {
    [Speaker::You, Speaker::Astra]
        .into_iter()
        .find_map(|speaker| chunk.strip_prefix(&speaker.prefix()).map(|rest| (speaker, rest)))
}
