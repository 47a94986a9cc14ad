//! Junk generator for exercising the clip/burst detector.
//!
//! Only compiled with the `glitch-injection` feature. Each call rolls the
//! dice once per glitch kind and corrupts the buffer in place.

use rand::Rng;

/// Chance per call for each glitch kind.
pub const GLITCH_PROBABILITY: f32 = 0.008;

/// What [`inject_glitches`] wrote into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlitchKind {
    /// Every sample replaced with random full-range junk.
    Burst,
    /// First sample replaced with random full-range junk.
    Click,
    /// One sample set to positive infinity.
    Infinity,
    /// One sample set to NaN.
    NaN,
}

impl GlitchKind {
    pub const ALL: [GlitchKind; 4] = [
        GlitchKind::Burst,
        GlitchKind::Click,
        GlitchKind::Infinity,
        GlitchKind::NaN,
    ];

    /// Corrupt `data` with this glitch. Empty buffers are left alone.
    pub fn apply<R: Rng + ?Sized>(self, data: &mut [f32], rng: &mut R) {
        if data.is_empty() {
            return;
        }

        match self {
            GlitchKind::Burst => {
                for sample in data.iter_mut() {
                    *sample = junk(rng);
                }
            }
            GlitchKind::Click => data[0] = junk(rng),
            GlitchKind::Infinity => {
                let index = rng.gen_range(0..data.len());
                data[index] = f32::INFINITY;
            }
            GlitchKind::NaN => {
                let index = rng.gen_range(0..data.len());
                data[index] = f32::NAN;
            }
        }
    }
}

/// Full-range value that always clears the clip threshold.
fn junk<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let magnitude = rng.gen_range(1.0e3f32..1.0e30);
    if rng.gen::<bool>() {
        magnitude
    } else {
        -magnitude
    }
}

/// Randomly corrupt `data`; returns the glitches that were applied.
pub fn inject_glitches<R: Rng + ?Sized>(data: &mut [f32], rng: &mut R) -> Vec<GlitchKind> {
    let mut applied = Vec::new();
    for kind in GlitchKind::ALL {
        if rng.gen::<f32>() < GLITCH_PROBABILITY {
            kind.apply(data, rng);
            applied.push(kind);
        }
    }
    applied
}
