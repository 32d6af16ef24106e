use super::decay::DecayEnvelope;
use super::{GeneratorState, SignalGenerator};
use crate::wavetable::Wavetable;

/// Fractional bits of the phase accumulator
pub const FRACTIONAL_BITS: u32 = 32;

/// Note number of A4
pub const REFERENCE_NOTE: i32 = 69;
/// Frequency of A4 in Hz
pub const REFERENCE_FREQUENCY: f64 = 440.0;

/// Equal-tempered frequency of a MIDI-style note number
///
/// Formula: f = 440 * 2^((note - 69) / 12)
pub fn note_frequency(note_number: i32) -> f64 {
    REFERENCE_FREQUENCY * 2f64.powf(f64::from(note_number.saturating_sub(REFERENCE_NOTE)) / 12.0)
}

/// Fixed-point position within a wavetable cycle
///
/// The upper 32 bits index the table, the lower [`FRACTIONAL_BITS`] hold the
/// fraction. Addition wraps, and the index is reduced modulo the table length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseAccumulator {
    phase: u64,
    increment: u64,
}

impl PhaseAccumulator {
    /// Create an accumulator stepping through `table_len` entries at `frequency`
    pub fn new(table_len: usize, frequency: f64, sample_rate: u32) -> Self {
        let step = table_len as f64 * frequency / f64::from(sample_rate);
        Self {
            phase: 0,
            // `as` saturates, so a zero sample rate cannot wrap
            increment: (step * (1u64 << FRACTIONAL_BITS) as f64).round() as u64,
        }
    }

    pub fn increment(&self) -> u64 {
        self.increment
    }

    /// Table index for the current phase
    #[inline]
    pub fn index(&self, table_len: usize) -> usize {
        ((self.phase >> FRACTIONAL_BITS) as usize) % table_len
    }

    #[inline]
    pub fn advance(&mut self) {
        self.phase = self.phase.wrapping_add(self.increment);
    }

    pub fn reset(&mut self) {
        self.phase = 0;
    }
}

/// Wavetable oscillator with exponential decay for a single note event
///
/// Algorithm per sample:
/// 1. Read table[(phase >> 32) mod len]
/// 2. Multiply by the envelope amplitude (starts at volume / 100)
/// 3. Round and clamp to i16
/// 4. phase += increment (wrapping), amplitude *= decay_rate
pub struct WavetableVoice<'a> {
    table: &'a Wavetable,
    phase: PhaseAccumulator,
    envelope: DecayEnvelope,
    position: usize,
    duration: usize,
    completed: bool,
}

impl<'a> WavetableVoice<'a> {
    /// Create a voice for one note
    ///
    /// # Arguments
    /// * `table` - Single-cycle waveform
    /// * `frequency` - Pitch in Hz
    /// * `sample_rate` - Output sample rate in Hz
    /// * `envelope` - Amplitude envelope for the note
    /// * `duration_samples` - Number of samples to produce
    pub fn new(
        table: &'a Wavetable,
        frequency: f64,
        sample_rate: u32,
        envelope: DecayEnvelope,
        duration_samples: usize,
    ) -> Self {
        Self {
            table,
            phase: PhaseAccumulator::new(table.len(), frequency, sample_rate),
            envelope,
            position: 0,
            duration: duration_samples,
            completed: duration_samples == 0,
        }
    }

    pub fn envelope(&self) -> &DecayEnvelope {
        &self.envelope
    }

    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    fn next_sample(&mut self) -> i16 {
        let raw = f64::from(self.table.sample(self.phase.index(self.table.len())));
        let value = raw * self.envelope.next_amplitude();
        self.phase.advance();
        value.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
    }
}

impl SignalGenerator for WavetableVoice<'_> {
    fn process(&mut self, buffer: &mut [i16]) -> GeneratorState {
        let remaining = self.duration - self.position;
        let active = buffer.len().min(remaining);

        for sample in buffer[..active].iter_mut() {
            *sample = self.next_sample();
        }
        buffer[active..].fill(0);

        self.position += active;
        if self.position >= self.duration {
            self.completed = true;
            GeneratorState::Complete
        } else {
            GeneratorState::Running
        }
    }

    fn is_complete(&self) -> bool {
        self.completed
    }

    fn reset(&mut self) {
        self.phase.reset();
        self.envelope.reset();
        self.position = 0;
        self.completed = self.duration == 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_table() -> Wavetable {
        Wavetable::new((0..8).map(|i| i * 1000).collect()).unwrap()
    }

    #[test]
    fn test_reference_frequencies() {
        assert!((note_frequency(69) - 440.0).abs() < 1e-9);
        assert!((note_frequency(81) - 880.0).abs() < 1e-9);
        assert!((note_frequency(57) - 220.0).abs() < 1e-9);
        assert!((note_frequency(60) - 261.6255653005986).abs() < 1e-9);
    }

    #[test]
    fn test_phase_increment() {
        // One table entry per sample
        let phase = PhaseAccumulator::new(8, 1000.0, 8000);
        assert_eq!(phase.increment(), 1u64 << FRACTIONAL_BITS);

        // Half an entry per sample
        let phase = PhaseAccumulator::new(8, 500.0, 8000);
        assert_eq!(phase.increment(), 1u64 << (FRACTIONAL_BITS - 1));
    }

    #[test]
    fn test_phase_wraps_through_table() {
        let mut phase = PhaseAccumulator::new(8, 3000.0, 8000);
        let indices: Vec<usize> = (0..6)
            .map(|_| {
                let i = phase.index(8);
                phase.advance();
                i
            })
            .collect();
        assert_eq!(indices, vec![0, 3, 6, 1, 4, 7]);
    }

    #[test]
    fn test_phase_accumulator_overflow_wraps() {
        let mut phase = PhaseAccumulator {
            phase: u64::MAX - 1,
            increment: 4,
        };
        phase.advance();
        assert_eq!(phase.phase, 2);
        assert_eq!(phase.index(8), 0);
    }

    #[test]
    fn test_voice_reads_table_without_decay() {
        let table = ramp_table();
        let env = DecayEnvelope::new(1.0, 1.0);
        let mut voice = WavetableVoice::new(&table, 1000.0, 8000, env, 10);

        let mut buffer = [0i16; 10];
        let state = voice.process(&mut buffer);
        assert_eq!(state, GeneratorState::Complete);
        assert_eq!(buffer, [0, 1000, 2000, 3000, 4000, 5000, 6000, 7000, 0, 1000]);
    }

    #[test]
    fn test_voice_applies_volume_and_decay() {
        let table = Wavetable::new(vec![10000]).unwrap();
        let env = DecayEnvelope::new(0.5, 0.5);
        let mut voice = WavetableVoice::new(&table, 440.0, 44100, env, 4);

        let mut buffer = [0i16; 4];
        voice.process(&mut buffer);
        assert_eq!(buffer, [5000, 2500, 1250, 625]);
    }

    #[test]
    fn test_voice_clamps_to_i16() {
        let table = Wavetable::new(vec![i16::MAX, i16::MIN]).unwrap();
        let env = DecayEnvelope::new(2.0, 1.0);
        let mut voice = WavetableVoice::new(&table, 22050.0, 44100, env, 2);

        let mut buffer = [0i16; 2];
        voice.process(&mut buffer);
        assert_eq!(buffer, [i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_voice_frames_are_continuous() {
        let table = ramp_table();
        let mut whole = WavetableVoice::new(&table, 1234.5, 8000, DecayEnvelope::new(0.9, 0.999), 100);
        let mut framed = WavetableVoice::new(&table, 1234.5, 8000, DecayEnvelope::new(0.9, 0.999), 100);

        let mut expected = vec![0i16; 100];
        whole.process(&mut expected);

        let mut actual = vec![0i16; 100];
        for frame in actual.chunks_mut(7) {
            framed.process(frame);
        }
        assert_eq!(expected, actual);
        assert!(framed.is_complete());
    }

    #[test]
    fn test_voice_pads_past_end_and_resets() {
        let table = ramp_table();
        let mut voice = WavetableVoice::new(&table, 1000.0, 8000, DecayEnvelope::new(1.0, 1.0), 3);

        let mut buffer = [9i16; 5];
        voice.process(&mut buffer);
        assert_eq!(buffer, [0, 1000, 2000, 0, 0]);
        assert_eq!(voice.position(), 3);

        voice.reset();
        assert!(!voice.is_complete());
        assert_eq!(voice.envelope().current_amplitude(), 1.0);
        let mut buffer = [0i16; 3];
        voice.process(&mut buffer);
        assert_eq!(buffer, [0, 1000, 2000]);
    }
}
