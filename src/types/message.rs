//! Outbound message types and rendering

use crate::{Result, SockFeedError};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Timestamp layout used in every rendered body (local time, second precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wire encoding of each message
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    /// `<timestamp> - <message> - #<seq>`
    #[default]
    Text,
    /// `{"timestamp": ..., "message": ..., "level": ...}`
    Json,
}

impl fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageFormat::Text => write!(f, "text"),
            MessageFormat::Json => write!(f, "json"),
        }
    }
}

/// Severity label carried by JSON bodies
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Debug-level messages
    Debug,
    /// Informational messages
    #[default]
    Info,
    /// Warning conditions
    Warn,
    /// Error conditions
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Serialize)]
struct JsonBody<'a> {
    timestamp: &'a str,
    message: String,
    level: LogLevel,
}

/// Single-line JSON with `": "` after keys, `", "` between members, and
/// every non-ASCII character written as a `\uXXXX` escape.
struct WireFormatter;

impl serde_json::ser::Formatter for WireFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            // Astral characters become a surrogate pair
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// A sequence-numbered, timestamped rendering of the template message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Position of this message in the run, starting at 1
    pub sequence: u64,

    /// Local wall-clock time the message was built
    pub timestamp: DateTime<Local>,

    body: String,
}

impl OutboundMessage {
    /// Build a message stamped with the current local time
    pub fn now(
        format: MessageFormat,
        template: &str,
        level: LogLevel,
        sequence: u64,
    ) -> Result<Self> {
        Self::new(format, template, level, sequence, Local::now())
    }

    /// Build a message with an explicit timestamp
    pub fn new(
        format: MessageFormat,
        template: &str,
        level: LogLevel,
        sequence: u64,
        timestamp: DateTime<Local>,
    ) -> Result<Self> {
        let stamp = timestamp.format(TIMESTAMP_FORMAT).to_string();
        let body = match format {
            MessageFormat::Text => format!("{} - {} - #{}\n", stamp, template, sequence),
            MessageFormat::Json => {
                let mut line = to_json_line(&JsonBody {
                    timestamp: &stamp,
                    message: format!("{} - #{}", template, sequence),
                    level,
                })?;
                line.push('\n');
                line
            }
        };

        Ok(Self {
            sequence,
            timestamp,
            body,
        })
    }

    /// Full wire body, including the trailing newline
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Wire bytes written to the connection
    pub fn as_bytes(&self) -> &[u8] {
        self.body.as_bytes()
    }

    /// Body without the trailing newline, as echoed on the console
    pub fn display_line(&self) -> &str {
        self.body.trim()
    }
}

fn to_json_line<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, WireFormatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf)
        .map_err(|e| SockFeedError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeZone};

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 42).unwrap()
    }

    #[test]
    fn test_text_body_layout() {
        let msg =
            OutboundMessage::new(MessageFormat::Text, "hello", LogLevel::Info, 3, fixed_time())
                .unwrap();

        assert_eq!(msg.body(), "2024-03-09 07:05:42 - hello - #3\n");
        assert_eq!(msg.display_line(), "2024-03-09 07:05:42 - hello - #3");
        assert_eq!(msg.sequence, 3);
    }

    #[test]
    fn test_json_body_layout() {
        let msg =
            OutboundMessage::new(MessageFormat::Json, "ping", LogLevel::Info, 1, fixed_time())
                .unwrap();

        assert_eq!(
            msg.body(),
            "{\"timestamp\": \"2024-03-09 07:05:42\", \"message\": \"ping - #1\", \
             \"level\": \"INFO\"}\n"
        );
        assert!(!msg.display_line().contains('\n'));
    }

    #[test]
    fn test_json_escapes_non_ascii() {
        let template = "caf\u{e9} \u{2603} \u{1f600}";
        let msg =
            OutboundMessage::new(MessageFormat::Json, template, LogLevel::Info, 2, fixed_time())
                .unwrap();

        assert!(msg.body().is_ascii());
        assert!(msg
            .body()
            .contains(r#""message": "caf\u00e9 \u2603 \ud83d\ude00 - #2""#));

        let parsed: serde_json::Value = serde_json::from_str(msg.display_line()).unwrap();
        assert_eq!(parsed["message"], format!("{} - #2", template));

        // Text bodies carry the template bytes untouched
        let text =
            OutboundMessage::new(MessageFormat::Text, template, LogLevel::Info, 2, fixed_time())
                .unwrap();
        assert!(text.body().contains(template));
    }

    #[test]
    fn test_json_body_parses_and_escapes() {
        let template = "say \"hi\"\tand\nbye";
        let msg = OutboundMessage::now(MessageFormat::Json, template, LogLevel::Warn, 42).unwrap();

        // Exactly one line on the wire, even with control characters in the template
        assert_eq!(msg.body().matches('\n').count(), 1);
        assert!(msg.body().ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(msg.display_line()).unwrap();
        assert_eq!(parsed["message"], format!("{} - #42", template));
        assert_eq!(parsed["level"], "WARN");
        let stamp = parsed["timestamp"].as_str().unwrap();
        assert!(NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(parsed.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_now_uses_second_precision_timestamp() {
        let msg = OutboundMessage::now(MessageFormat::Text, "tick", LogLevel::Info, 7).unwrap();
        let line = msg.display_line();

        let (stamp, rest) = line.split_at(19);
        assert!(NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(rest, " - tick - #7");
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Debug.to_string(), "DEBUG");
        assert_eq!(LogLevel::Error.to_string(), "ERROR");
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"WARN\"");
    }

    #[test]
    fn test_format_names() {
        assert_eq!(MessageFormat::default(), MessageFormat::Text);
        assert_eq!(MessageFormat::Json.to_string(), "json");
        let parsed: MessageFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(parsed, MessageFormat::Json);
    }
}
