//! Report entries.
//!
//! Every entry shares a [`MessageHeader`]; the variant-specific payload is a
//! closed [`MessageKind`]. Rendering is one exhaustive match, so adding a
//! variant is a compile error until it knows how to describe itself.

use crate::attribution::{ComponentId, ComponentNames, Identifier};
use crate::event::{note_name, HostEvent};
use crate::taxonomy::{FailureKind, Location};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Fields common to every entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageHeader {
    /// Ordering key within one drain window. Reset to 0 on every drain.
    pub sequence: u32,
    /// Render blocks processed since the session started.
    pub callback_index: u64,
    /// Seconds since the session started.
    pub timestamp: f64,
    pub owner: Option<ComponentId>,
    pub id: Option<Identifier>,
    pub location: Location,
}

/// Snapshot of one CPU load measurement that crossed the warning level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSample {
    pub owner: Option<ComponentId>,
    pub location: Location,
    /// Configured limit as a fraction (0.7 = 70%).
    pub limit: f64,
    /// Running average load in percent.
    pub average_percentage: f64,
    /// Load of the offending block in percent.
    pub peak_percentage: f64,
}

/// Value assigned to a scripted control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Number(f64),
    Integer(i64),
    Bool(bool),
    Text(String),
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<f32> for ParameterValue {
    fn from(v: f32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for ParameterValue {
    fn from(v: i32) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl core::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Variant payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    Failure {
        kind: FailureKind,
        extra: f64,
    },
    StringMessage {
        text: String,
    },
    Event {
        event: HostEvent,
    },
    AudioSettingChange {
        kind: FailureKind,
        old_value: f64,
        new_value: f64,
    },
    PerformanceWarning {
        sample: PerformanceSample,
        voice_count: usize,
    },
    ParameterChange {
        value: ParameterValue,
    },
}

/// One report entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub header: MessageHeader,
    pub kind: MessageKind,
}

impl Message {
    pub fn new(header: MessageHeader, kind: MessageKind) -> Self {
        Self { header, kind }
    }

    #[inline]
    pub fn sequence(&self) -> u32 {
        self.header.sequence
    }

    /// Failures and performance warnings count towards the error ceiling.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(
            self.kind,
            MessageKind::Failure { .. } | MessageKind::PerformanceWarning { .. }
        )
    }

    /// Failure kind, if this is a failure entry.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self.kind {
            MessageKind::Failure { kind, .. } => Some(kind),
            MessageKind::PerformanceWarning { .. } => Some(FailureKind::PerformanceWarning),
            _ => None,
        }
    }

    /// Whether the drain should append the captured call context after this
    /// entry.
    pub fn wants_backtrace(&self) -> bool {
        matches!(self.kind, MessageKind::Failure { kind, .. } if kind.attaches_backtrace())
    }

    /// Heading text naming the entry kind.
    pub fn title(&self) -> &'static str {
        match &self.kind {
            MessageKind::Failure { kind, .. } | MessageKind::AudioSettingChange { kind, .. } => {
                kind.name()
            }
            MessageKind::StringMessage { .. } => "Message",
            MessageKind::Event { .. } => "Event",
            MessageKind::PerformanceWarning { .. } => "PerformanceWarning",
            MessageKind::ParameterChange { .. } => "ParameterChange",
        }
    }

    /// Append this entry's Markdown block to `out`.
    pub fn render(&self, names: &dyn ComponentNames, out: &mut String) {
        // Writing into a String cannot fail.
        let _ = self.render_inner(names, out);
    }

    /// Render into a fresh string.
    pub fn to_text(&self, names: &dyn ComponentNames) -> String {
        let mut out = String::with_capacity(160);
        self.render(names, &mut out);
        out
    }

    fn render_inner(&self, names: &dyn ComponentNames, out: &mut String) -> std::fmt::Result {
        writeln!(out, "### {}", self.title())?;
        self.write_time_line(out)?;

        match &self.kind {
            MessageKind::Failure { extra, .. } => {
                self.write_location_line(names, out)?;
                if *extra != 0.0 {
                    writeln!(out, "- AdditionalInfo: **{:.3}**  ", extra)?;
                }
            }
            MessageKind::StringMessage { text } => {
                writeln!(out, "- Message: {}  ", text)?;
            }
            MessageKind::Event { event } => {
                let (v1, v2) = event.data_values();
                let v1 = if event.is_note_on_or_off() {
                    note_name(v1)
                } else {
                    v1.to_string()
                };
                writeln!(
                    out,
                    "- **{}** ID: `{}` TS: `{}` V1: `{}`, V2: `{}`, Ch: `{}`  ",
                    event.type_name(),
                    event.event_id,
                    event.frame_offset,
                    v1,
                    v2,
                    event.channel_number()
                )?;
            }
            MessageKind::AudioSettingChange {
                old_value,
                new_value,
                ..
            } => {
                writeln!(out, "- Old: **{:.0}**  ", old_value)?;
                writeln!(out, "- New: **{:.0}**  ", new_value)?;
            }
            MessageKind::PerformanceWarning {
                sample,
                voice_count,
            } => {
                self.write_location_line(names, out)?;
                writeln!(out, "- Voice Amount: **{}**  ", voice_count)?;
                writeln!(
                    out,
                    "- Limit: `{:.1}%` Avg: `{:.2}%`, Peak: `{:.1}%`  ",
                    100.0 * sample.limit,
                    sample.average_percentage,
                    sample.peak_percentage
                )?;
            }
            MessageKind::ParameterChange { value } => {
                if let Some(owner) = self.header.owner {
                    writeln!(out, "- Processor: `{}`  ", names.display_name(owner))?;
                }
                let id = self.header.id.as_ref().map(Identifier::as_str).unwrap_or("");
                writeln!(out, "- ID: `{}` value: `{}`  ", id, value)?;
            }
        }

        writeln!(out)
    }

    fn write_time_line(&self, out: &mut String) -> std::fmt::Result {
        writeln!(
            out,
            "- Time: **{:.2}** / CallbackIndex: **{}**  ",
            self.header.timestamp, self.header.callback_index
        )
    }

    fn write_location_line(&self, names: &dyn ComponentNames, out: &mut String) -> std::fmt::Result {
        out.push_str("- Location: `");
        if let Some(owner) = self.header.owner {
            write!(out, "{}::", names.display_name(owner))?;
        }
        if let Some(id) = &self.header.id {
            write!(out, "{}::", id)?;
        }
        writeln!(out, "{}`  ", self.header.location)
    }
}
