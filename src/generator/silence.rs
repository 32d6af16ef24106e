use super::{GeneratorState, SignalGenerator};

/// Generator for rests
///
/// Writes zero samples for a fixed duration, then completes.
pub struct SilenceGenerator {
    /// Current sample position
    position: usize,
    /// Total duration in samples
    duration: usize,
    /// Whether the generator has completed
    completed: bool,
}

impl SilenceGenerator {
    /// Create a new silence generator
    ///
    /// # Example
    /// ```
    /// use mmlsynth::generator::SilenceGenerator;
    ///
    /// let rest = SilenceGenerator::new(22050); // quarter rest at 120 BPM, 44.1kHz
    /// ```
    pub fn new(duration_samples: usize) -> Self {
        Self {
            position: 0,
            duration: duration_samples,
            completed: duration_samples == 0,
        }
    }

    /// Get the current position in samples
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the total duration in samples
    pub fn duration(&self) -> usize {
        self.duration
    }
}

impl SignalGenerator for SilenceGenerator {
    fn process(&mut self, buffer: &mut [i16]) -> GeneratorState {
        buffer.fill(0);

        if self.completed {
            return GeneratorState::Complete;
        }

        self.position = (self.position + buffer.len()).min(self.duration);
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
        self.position = 0;
        self.completed = self.duration == 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_basic() {
        let mut rest = SilenceGenerator::new(10);
        let mut buffer = [7i16; 5];

        let state = rest.process(&mut buffer);
        assert_eq!(state, GeneratorState::Running);
        assert_eq!(buffer, [0; 5]);
        assert_eq!(rest.position(), 5);

        let state = rest.process(&mut buffer);
        assert_eq!(state, GeneratorState::Complete);
        assert!(rest.is_complete());
    }

    #[test]
    fn test_silence_reset() {
        let mut rest = SilenceGenerator::new(4);
        let mut buffer = [1i16; 8];

        rest.process(&mut buffer);
        assert!(rest.is_complete());
        assert_eq!(rest.position(), 4);

        rest.reset();
        assert!(!rest.is_complete());
        assert_eq!(rest.position(), 0);
        assert_eq!(rest.duration(), 4);
    }

    #[test]
    fn test_zero_length_is_complete() {
        let rest = SilenceGenerator::new(0);
        assert!(rest.is_complete());
    }
}
