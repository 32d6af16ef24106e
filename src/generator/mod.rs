pub mod decay;
pub mod silence;
pub mod wavetable;

pub use decay::DecayEnvelope;
pub use silence::SilenceGenerator;
pub use wavetable::{note_frequency, PhaseAccumulator, WavetableVoice, FRACTIONAL_BITS};

/// Represents the current state of a signal generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Generator is still producing samples
    Running,
    /// Generator has completed and will produce no more samples
    Complete,
}

/// Core trait for all signal generators
///
/// Signal generators produce 16-bit PCM samples frame by frame. Each
/// generator renders exactly one note event.
pub trait SignalGenerator {
    /// Process the next frame of samples
    ///
    /// # Arguments
    /// * `buffer` - Mutable slice to write samples into. The length determines frame size.
    ///
    /// # Returns
    /// * `GeneratorState::Running` if the generator is still active
    /// * `GeneratorState::Complete` if the generator has finished
    ///
    /// # Note
    /// Samples past the end of the event are written as silence.
    fn process(&mut self, buffer: &mut [i16]) -> GeneratorState;

    /// Check if this generator has completed
    fn is_complete(&self) -> bool;

    /// Reset the generator to its initial state
    fn reset(&mut self);
}
