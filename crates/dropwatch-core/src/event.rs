//! Musical event snapshots.
//!
//! The engine hands the logger its per-block event batch; each event is
//! copied as-is so the drain worker can describe it later.

use midi_msg::{Channel, ChannelVoiceMsg, ControlChange};

/// Event as seen by the render callback: a channel voice message plus the
/// engine's event id and its sample offset in the current block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostEvent {
    pub event_id: u16,
    /// Offset within the current buffer (0 = first sample).
    pub frame_offset: usize,
    pub channel: Channel,
    pub msg: ChannelVoiceMsg,
}

impl HostEvent {
    #[inline]
    pub fn new(event_id: u16, frame_offset: usize, channel: Channel, msg: ChannelVoiceMsg) -> Self {
        Self {
            event_id,
            frame_offset,
            channel,
            msg,
        }
    }

    #[inline]
    pub fn note_on(event_id: u16, frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(
            event_id,
            frame_offset,
            Channel::from_u8(channel),
            ChannelVoiceMsg::NoteOn { note, velocity },
        )
    }

    #[inline]
    pub fn note_off(event_id: u16, frame_offset: usize, channel: u8, note: u8) -> Self {
        Self::new(
            event_id,
            frame_offset,
            Channel::from_u8(channel),
            ChannelVoiceMsg::NoteOff { note, velocity: 0 },
        )
    }

    #[inline]
    pub fn control_change(event_id: u16, frame_offset: usize, channel: u8, cc: u8, value: u8) -> Self {
        Self::new(
            event_id,
            frame_offset,
            Channel::from_u8(channel),
            ChannelVoiceMsg::ControlChange {
                control: ControlChange::CC { control: cc, value },
            },
        )
    }

    #[inline]
    pub fn aftertouch(event_id: u16, frame_offset: usize, channel: u8, pressure: u8) -> Self {
        Self::new(
            event_id,
            frame_offset,
            Channel::from_u8(channel),
            ChannelVoiceMsg::ChannelPressure { pressure },
        )
    }

    #[inline]
    pub fn poly_aftertouch(event_id: u16, frame_offset: usize, channel: u8, note: u8, pressure: u8) -> Self {
        Self::new(
            event_id,
            frame_offset,
            Channel::from_u8(channel),
            ChannelVoiceMsg::PolyPressure { note, pressure },
        )
    }

    /// Channel and polyphonic pressure are never logged.
    #[inline]
    pub fn is_aftertouch(&self) -> bool {
        matches!(
            self.msg,
            ChannelVoiceMsg::ChannelPressure { .. } | ChannelVoiceMsg::PolyPressure { .. }
        )
    }

    #[inline]
    pub fn is_note_on_or_off(&self) -> bool {
        matches!(
            self.msg,
            ChannelVoiceMsg::NoteOn { .. }
                | ChannelVoiceMsg::NoteOff { .. }
                | ChannelVoiceMsg::HighResNoteOn { .. }
                | ChannelVoiceMsg::HighResNoteOff { .. }
        )
    }

    /// 1-based channel number as shown to users.
    #[inline]
    pub fn channel_number(&self) -> u8 {
        self.channel as u8 + 1
    }

    pub fn type_name(&self) -> &'static str {
        match self.msg {
            ChannelVoiceMsg::NoteOn { velocity: 0, .. } => "NoteOff",
            ChannelVoiceMsg::NoteOn { .. } | ChannelVoiceMsg::HighResNoteOn { .. } => "NoteOn",
            ChannelVoiceMsg::NoteOff { .. } | ChannelVoiceMsg::HighResNoteOff { .. } => "NoteOff",
            ChannelVoiceMsg::ControlChange { .. } => "Controller",
            ChannelVoiceMsg::ProgramChange { .. } => "ProgramChange",
            ChannelVoiceMsg::PitchBend { .. } => "PitchBend",
            ChannelVoiceMsg::ChannelPressure { .. } => "Aftertouch",
            ChannelVoiceMsg::PolyPressure { .. } => "PolyAftertouch",
            #[allow(unreachable_patterns)]
            _ => "Unknown",
        }
    }

    /// The two 7-bit data values (note/velocity, controller/value, …).
    pub fn data_values(&self) -> (u8, u8) {
        match self.msg {
            ChannelVoiceMsg::NoteOn { note, velocity }
            | ChannelVoiceMsg::NoteOff { note, velocity } => (note, velocity),
            ChannelVoiceMsg::HighResNoteOn { note, velocity }
            | ChannelVoiceMsg::HighResNoteOff { note, velocity } => (note, (velocity >> 9) as u8),
            ChannelVoiceMsg::ControlChange { control } => match control {
                ControlChange::CC { control, value } => (control, value),
                ControlChange::CCHighRes {
                    control1, value, ..
                } => (control1, (value >> 7) as u8),
                _ => (0, 0),
            },
            ChannelVoiceMsg::ProgramChange { program } => (program, 0),
            ChannelVoiceMsg::PitchBend { bend } => ((bend & 0x7f) as u8, (bend >> 7) as u8),
            ChannelVoiceMsg::ChannelPressure { pressure } => (0, pressure),
            ChannelVoiceMsg::PolyPressure { note, pressure } => (note, pressure),
            #[allow(unreachable_patterns)]
            _ => (0, 0),
        }
    }
}

/// Note name with sharps, middle C (60) as `C3`.
pub fn note_name(note: u8) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = (note / 12) as i32 - 2;
    format!("{}{}", NAMES[(note % 12) as usize], octave)
}
