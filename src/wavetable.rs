//! Single-cycle wavetables
//!
//! A wavetable holds one period of a waveform as signed 16-bit amplitudes.
//! Tables can be built in code, generated with [`Wavetable::harmonic`], or
//! loaded from a text file of whitespace-separated numbers such as
//! `0 3 5 7 5 3 0 -3 -5 -8 -5 -3`, and saved back in the same form.

use std::f64::consts::PI;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Entries in the built-in table
pub const DEFAULT_TABLE_SIZE: usize = 1024;
/// Peak amplitude of the built-in table (close to the 16-bit maximum)
pub const DEFAULT_AMPLITUDE: f64 = 32760.0;

#[derive(Error, Debug)]
pub enum WavetableError {
    #[error("wavetable has no samples")]
    Empty,

    #[error("invalid sample {token:?} at position {index}")]
    InvalidSample { index: usize, token: String },

    #[error("sample {value} at position {index} does not fit in 16 bits")]
    OutOfRange { index: usize, value: f64 },

    #[error("cannot read wavetable: {0}")]
    Io(#[from] std::io::Error),
}

/// One cycle of a waveform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wavetable {
    samples: Vec<i16>,
}

impl Wavetable {
    /// Create a wavetable from raw samples
    ///
    /// # Errors
    /// Returns `WavetableError::Empty` if `samples` is empty.
    pub fn new(samples: Vec<i16>) -> Result<Self, WavetableError> {
        if samples.is_empty() {
            return Err(WavetableError::Empty);
        }
        Ok(Self { samples })
    }

    /// Sum of the first three harmonics: 0.5 sin(x) + 0.3 sin(2x) + 0.2 sin(3x)
    ///
    /// # Example
    /// ```
    /// use mmlsynth::wavetable::Wavetable;
    ///
    /// let table = Wavetable::harmonic(1024, 32760.0);
    /// assert_eq!(table.len(), 1024);
    /// assert_eq!(table.sample(0), 0);
    /// ```
    pub fn harmonic(size: usize, amplitude: f64) -> Self {
        let size = size.max(1);
        let samples = (0..size)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / size as f64;
                let value = 0.5 * angle.sin() + 0.3 * (2.0 * angle).sin() + 0.2 * (3.0 * angle).sin();
                to_i16(value * amplitude)
            })
            .collect();
        Self { samples }
    }

    /// Parse whitespace-separated integer or decimal samples
    pub fn from_text(text: &str) -> Result<Self, WavetableError> {
        let samples = text
            .split_whitespace()
            .enumerate()
            .map(|(index, token)| parse_sample(index, token))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(samples)
    }

    /// Load a wavetable text file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WavetableError> {
        let text = fs::read_to_string(path)?;
        Self::from_text(&text)
    }

    /// Space-separated text form, readable by [`Wavetable::from_text`]
    ///
    /// Every sample is followed by a single space, the layout the waveform
    /// editor writes.
    pub fn to_text(&self) -> String {
        self.samples.iter().map(|s| format!("{s} ")).collect()
    }

    /// Write the table to a text file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WavetableError> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    /// Rescale so that the largest magnitude becomes `peak`
    ///
    /// Small-range tables (e.g. 4-bit values in -8..7) need this before they
    /// are audible at 16 bits. A silent table is returned unchanged.
    pub fn scaled(&self, peak: f64) -> Self {
        let max = self
            .samples
            .iter()
            .map(|&s| f64::from(s).abs())
            .fold(0.0, f64::max);
        if max == 0.0 {
            return self.clone();
        }

        let factor = peak / max;
        let samples = self
            .samples
            .iter()
            .map(|&s| to_i16(f64::from(s) * factor))
            .collect();
        Self { samples }
    }

    /// Sample at `index`, wrapping around the cycle
    #[inline]
    pub fn sample(&self, index: usize) -> i16 {
        self.samples[index % self.samples.len()]
    }

    /// Number of entries in one cycle (never zero)
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> i32 {
        self.samples
            .iter()
            .map(|&s| i32::from(s).abs())
            .max()
            .unwrap_or(0)
    }
}

impl Default for Wavetable {
    fn default() -> Self {
        Self::harmonic(DEFAULT_TABLE_SIZE, DEFAULT_AMPLITUDE)
    }
}

fn parse_sample(index: usize, token: &str) -> Result<i16, WavetableError> {
    let value: f64 = token.parse().map_err(|_| WavetableError::InvalidSample {
        index,
        token: token.to_string(),
    })?;
    let rounded = value.round();
    if !rounded.is_finite() || rounded < f64::from(i16::MIN) || rounded > f64::from(i16::MAX) {
        return Err(WavetableError::OutOfRange { index, value });
    }
    Ok(rounded as i16)
}

fn to_i16(value: f64) -> i16 {
    value.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}
