//! Closed sets of render-graph locations and failure kinds.
//!
//! Both enums are `#[repr(u8)]` so they fit into an atomic marker on the
//! render thread. Name lookup by raw discriminant is total: values outside the
//! set map to an explicit sentinel instead of failing.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Display name for a location discriminant that is not part of [`Location`].
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Display name for a failure discriminant that is not part of [`FailureKind`].
pub const UNKNOWN_FAILURE: &str = "Unknown failure";

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $unknown:ident, $err:ident {
            $($variant:ident = $value:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum $name {
            #[default]
            $($variant = $value),*
        }

        impl $name {
            /// All values in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            /// Stable display name.
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),*
                }
            }

            /// Raw discriminant.
            #[inline]
            pub const fn as_u8(self) -> u8 {
                self as u8
            }

            /// Total lookup from a raw discriminant.
            pub fn name_of(raw: u8) -> &'static str {
                Self::try_from(raw).map(Self::name).unwrap_or($unknown)
            }
        }

        impl TryFrom<u8> for $name {
            type Error = Error;

            fn try_from(raw: u8) -> Result<Self, Error> {
                match raw {
                    $($value => Ok($name::$variant),)*
                    other => Err(Error::$err(other)),
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

closed_enum! {
    /// Render-graph call site where a check happened.
    ///
    /// Declaration order follows the render graph from the device callback
    /// down to the individual voice, so `a < b` reads as "`a` runs upstream
    /// of `b`" for the sampler and synth chains.
    Location, UNKNOWN_LOCATION, UnknownLocation {
        Empty = 0,
        MainRenderCallback = 1,
        MultiMicSampleRendering = 2,
        SampleRendering = 3,
        ScriptFxRendering = 4,
        ScriptFxRenderingPost = 5,
        DspInstanceRendering = 6,
        DspInstanceRenderingPost = 7,
        TimerCallback = 8,
        SampleLoaderPreFillVoiceBufferRead = 9,
        SampleLoaderPreFillVoiceBufferWrite = 10,
        SampleLoaderPostFillVoiceBuffer = 11,
        SampleLoaderPostFillVoiceBufferWrapped = 12,
        SampleVoiceBufferFill = 13,
        SampleVoiceBufferFillPost = 14,
        SampleLoaderReadOperation = 15,
        SynthRendering = 16,
        SynthPreVoiceRendering = 17,
        SynthPostVoiceRenderingGainMod = 18,
        SynthPostVoiceRendering = 19,
        SynthChainRendering = 20,
        SampleStart = 21,
        VoiceEffectRendering = 22,
        ModulatorChainVoiceRendering = 23,
        ModulatorChainTimeVariantRendering = 24,
        SynthVoiceRendering = 25,
        NoteOnCallback = 26,
        NoteOffCallback = 27,
        MasterEffectRendering = 28,
        ScriptMidiEventCallback = 29,
        ConvolutionRendering = 30,
    }
}

closed_enum! {
    /// Kind of anomaly carried by a failure entry.
    FailureKind, UNKNOWN_FAILURE, UnknownFailureKind {
        Empty = 0,
        SampleRateChange = 1,
        Assertion = 2,
        BufferSizeChange = 3,
        PerformanceWarning = 4,
        BurstLeft = 5,
        BurstRight = 6,
        ClickLeft = 7,
        ClickRight = 8,
        AudioThreadWasLocked = 9,
        Discontinuity = 10,
        PriorityInversion = 11,
        SampleLoadingError = 12,
        StreamingFailure = 13,
    }
}

impl FailureKind {
    /// Click/burst kind for an out-of-range excursion of `faulty_samples`
    /// samples on one channel.
    pub fn for_excursion(is_left_channel: bool, faulty_samples: usize) -> Self {
        match (faulty_samples == 1, is_left_channel) {
            (true, true) => FailureKind::ClickLeft,
            (true, false) => FailureKind::ClickRight,
            (false, true) => FailureKind::BurstLeft,
            (false, false) => FailureKind::BurstRight,
        }
    }

    /// Only priority inversions carry the captured call context.
    pub fn attaches_backtrace(self) -> bool {
        self == FailureKind::PriorityInversion
    }

    /// Device reconfiguration kinds reported as audio setting changes.
    pub fn is_audio_setting(self) -> bool {
        matches!(
            self,
            FailureKind::SampleRateChange | FailureKind::BufferSizeChange
        )
    }
}

/// Total name lookup for a raw location value.
pub fn location_name(raw: u8) -> &'static str {
    Location::name_of(raw)
}

/// Total name lookup for a raw failure kind value.
pub fn failure_name(raw: u8) -> &'static str {
    FailureKind::name_of(raw)
}
