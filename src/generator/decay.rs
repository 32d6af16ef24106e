/// Exponential decay envelope
///
/// Starts at an initial amplitude and multiplies it by a fixed rate after
/// every sample. There are no phases: the envelope only ever shrinks (or
/// holds, for a rate of 1.0).
#[derive(Debug, Clone)]
pub struct DecayEnvelope {
    // Configuration
    initial_amplitude: f64,
    rate: f64,

    // State
    current_amplitude: f64,
}

impl DecayEnvelope {
    /// Create a new decay envelope
    ///
    /// # Arguments
    /// * `initial_amplitude` - Amplitude of the first sample (1.0 = full scale)
    /// * `rate` - Multiplier applied after each sample, in (0, 1]
    ///
    /// # Example
    /// ```
    /// use mmlsynth::generator::DecayEnvelope;
    ///
    /// let mut env = DecayEnvelope::new(1.0, 0.5);
    /// assert_eq!(env.next_amplitude(), 1.0);
    /// assert_eq!(env.next_amplitude(), 0.5);
    /// ```
    pub fn new(initial_amplitude: f64, rate: f64) -> Self {
        Self {
            initial_amplitude,
            rate,
            current_amplitude: initial_amplitude,
        }
    }

    /// Amplitude for the current sample, then advance by one sample
    #[inline]
    pub fn next_amplitude(&mut self) -> f64 {
        let amplitude = self.current_amplitude;
        self.current_amplitude *= self.rate;
        amplitude
    }

    /// Amplitude the next sample will use
    pub fn current_amplitude(&self) -> f64 {
        self.current_amplitude
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Return to the initial amplitude
    pub fn reset(&mut self) {
        self.current_amplitude = self.initial_amplitude;
    }
}
