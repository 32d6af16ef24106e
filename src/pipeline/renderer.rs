//! Synthesis engine
//!
//! Walks parsed note events in order and renders each one into its slice of
//! a single preallocated PCM buffer. Rests become silence; notes are played
//! by a [`WavetableVoice`] whose phase and decay restart at every event.

use crate::generator::{
    note_frequency, DecayEnvelope, GeneratorState, SignalGenerator, SilenceGenerator,
    WavetableVoice,
};
use crate::pipeline::parser::{NoteEvent, DEFAULT_VOLUME};
use crate::wavetable::Wavetable;
use log::{debug, info};
use std::collections::TryReserveError;
use thiserror::Error;

/// Largest buffer the renderer will try to allocate, in samples
pub const MAX_RENDER_SAMPLES: usize = isize::MAX as usize / std::mem::size_of::<i16>();

/// Frame size used by [`render`]
pub const DEFAULT_FRAME_SIZE: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("score needs {requested} samples but at most {limit} can be rendered")]
    TooLong { requested: u64, limit: usize },

    #[error("out of memory while allocating the output buffer: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

/// Renders note events against a wavetable
pub struct Renderer<'a> {
    wavetable: &'a Wavetable,
    sample_rate: u32,
    frame_size: usize,
    max_samples: usize,
}

impl<'a> Renderer<'a> {
    /// Create a renderer
    ///
    /// # Arguments
    /// * `wavetable` - Single-cycle waveform shared by all notes
    /// * `sample_rate` - Output sample rate in Hz
    pub fn new(wavetable: &'a Wavetable, sample_rate: u32) -> Self {
        Self {
            wavetable,
            sample_rate,
            frame_size: DEFAULT_FRAME_SIZE,
            max_samples: MAX_RENDER_SAMPLES,
        }
    }

    /// Number of samples generated per `process` call
    pub fn with_frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = frame_size.max(1);
        self
    }

    /// Reject scores longer than `max_samples`
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples.min(MAX_RENDER_SAMPLES);
        self
    }

    /// Total output length for `events`, checked against the limit
    pub fn total_samples(&self, events: &[NoteEvent]) -> Result<usize, RenderError> {
        let requested = events
            .iter()
            .try_fold(0u64, |acc, e| acc.checked_add(u64::from(e.duration_samples)))
            .unwrap_or(u64::MAX);

        usize::try_from(requested)
            .ok()
            .filter(|&total| total <= self.max_samples)
            .ok_or(RenderError::TooLong {
                requested,
                limit: self.max_samples,
            })
    }

    /// Render all events into a new buffer
    ///
    /// The buffer length is exactly the sum of the event durations.
    pub fn render(&self, events: &[NoteEvent]) -> Result<Vec<i16>, RenderError> {
        let total = self.total_samples(events)?;

        let mut buffer = Vec::new();
        buffer.try_reserve_exact(total)?;
        buffer.resize(total, 0);

        let mut offset = 0;
        for (index, event) in events.iter().enumerate() {
            let duration = event.duration_samples as usize;
            let output = &mut buffer[offset..offset + duration];
            debug!(
                "rendering event {} (note {}) at sample {} for {} samples",
                index, event.note_number, offset, duration
            );

            let written = if event.is_rest() {
                self.run(&mut SilenceGenerator::new(duration), output)
            } else {
                let envelope = DecayEnvelope::new(
                    f64::from(event.volume) / f64::from(DEFAULT_VOLUME),
                    event.decay_rate,
                );
                let mut voice = WavetableVoice::new(
                    self.wavetable,
                    note_frequency(event.note_number),
                    self.sample_rate,
                    envelope,
                    duration,
                );
                self.run(&mut voice, output)
            };
            debug_assert_eq!(written, duration);
            offset += duration;
        }

        info!(
            "rendered {} events into {} samples ({:.2}s)",
            events.len(),
            total,
            total as f64 / f64::from(self.sample_rate.max(1))
        );
        Ok(buffer)
    }

    /// Drive `generator` over `output` frame by frame until it completes
    ///
    /// Returns the number of samples written before completion.
    fn run(&self, generator: &mut dyn SignalGenerator, output: &mut [i16]) -> usize {
        let mut written = 0;
        for frame in output.chunks_mut(self.frame_size) {
            let state = generator.process(frame);
            written += frame.len();
            if state == GeneratorState::Complete {
                break;
            }
        }
        debug_assert!(generator.is_complete(), "generator outlived its event");
        written
    }
}

/// Render events with the default frame size and no length limit
///
/// # Example
/// ```
/// use mmlsynth::pipeline::{parse, render};
/// use mmlsynth::wavetable::Wavetable;
///
/// let events = parse("c d e", 44100).unwrap();
/// let pcm = render(&events, &Wavetable::default(), 44100).unwrap();
/// assert_eq!(pcm.len(), 3 * 22050);
/// ```
pub fn render(
    events: &[NoteEvent],
    wavetable: &Wavetable,
    sample_rate: u32,
) -> Result<Vec<i16>, RenderError> {
    Renderer::new(wavetable, sample_rate).render(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parser::{parse, DEFAULT_DECAY_RATE};

    fn event(note_number: i32, duration_samples: u32) -> NoteEvent {
        NoteEvent {
            note_number,
            duration_samples,
            volume: DEFAULT_VOLUME,
            decay_rate: 1.0,
        }
    }

    #[test]
    fn test_rests_render_silence() {
        let table = Wavetable::default();
        let events = vec![event(0, 100), event(0, 37), event(0, 1)];
        let pcm = render(&events, &table, 44100).unwrap();
        assert_eq!(pcm.len(), 138);
        assert!(pcm.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_length_matches_durations() {
        let table = Wavetable::default();
        let events = parse("t133 l8 c d+. r16 e&e32 n50 v40 g2..", 48000).unwrap();
        let expected: usize = events.iter().map(|e| e.duration_samples as usize).sum();
        let pcm = render(&events, &table, 48000).unwrap();
        assert_eq!(pcm.len(), expected);
    }

    #[test]
    fn test_empty_score() {
        let pcm = render(&[], &Wavetable::default(), 44100).unwrap();
        assert!(pcm.is_empty());
    }

    #[test]
    fn test_note_reads_wavetable() {
        let table = Wavetable::new(vec![0, 100, 200, 300]).unwrap();
        // 4 entries at 4x the note frequency steps one entry per sample
        let sample_rate = (note_frequency(69) * 4.0) as u32;
        let pcm = render(&[event(69, 6)], &table, sample_rate).unwrap();
        assert_eq!(pcm, vec![0, 100, 200, 300, 0, 100]);
    }

    #[test]
    fn test_each_event_restarts_phase_and_amplitude() {
        let table = Wavetable::new(vec![1000, 2000, 3000, 4000]).unwrap();
        let sample_rate = 1760;
        let decaying = NoteEvent {
            decay_rate: 0.5,
            ..event(69, 3)
        };
        let pcm = render(&[decaying, decaying], &table, sample_rate).unwrap();
        assert_eq!(pcm, vec![1000, 1000, 750, 1000, 1000, 750]);
    }

    #[test]
    fn test_volume_scales_amplitude() {
        let table = Wavetable::new(vec![10000]).unwrap();
        let quiet = NoteEvent {
            volume: 25,
            ..event(60, 2)
        };
        let loud = NoteEvent {
            volume: 400,
            ..event(60, 2)
        };
        let pcm = render(&[quiet, loud], &table, 44100).unwrap();
        assert_eq!(pcm, vec![2500, 2500, i16::MAX, i16::MAX]);
    }

    #[test]
    fn test_tied_note_decays_continuously() {
        let table = Wavetable::new(vec![10000]).unwrap();
        let events = parse("c4&c4", 100).unwrap();
        assert_eq!(events.len(), 1);
        let pcm = render(&events, &table, 100).unwrap();
        assert_eq!(pcm.len(), 100);
        // Amplitude keeps shrinking across the tie point instead of restarting
        assert!(pcm.windows(2).all(|w| w[1] <= w[0]));
        let expected_last = (10000.0 * DEFAULT_DECAY_RATE.powi(99)).round() as i16;
        assert_eq!(pcm[99], expected_last);
    }

    #[test]
    fn test_frame_size_does_not_change_output() {
        let table = Wavetable::default();
        let events = parse("o5 c8 d8 r8 e4.", 22050).unwrap();
        let reference = Renderer::new(&table, 22050).with_frame_size(1).render(&events).unwrap();
        for frame_size in [7, 64, 4096] {
            let pcm = Renderer::new(&table, 22050)
                .with_frame_size(frame_size)
                .render(&events)
                .unwrap();
            assert_eq!(pcm, reference, "frame size {frame_size}");
        }
    }

    /// Counts `process` calls and completes after `limit` samples
    struct CountingGenerator {
        calls: usize,
        remaining: usize,
    }

    impl SignalGenerator for CountingGenerator {
        fn process(&mut self, buffer: &mut [i16]) -> GeneratorState {
            self.calls += 1;
            buffer.fill(1);
            self.remaining = self.remaining.saturating_sub(buffer.len());
            if self.remaining == 0 {
                GeneratorState::Complete
            } else {
                GeneratorState::Running
            }
        }

        fn is_complete(&self) -> bool {
            self.remaining == 0
        }

        fn reset(&mut self) {}
    }

    #[test]
    fn test_run_stops_when_generator_completes() {
        let table = Wavetable::default();
        let renderer = Renderer::new(&table, 44100).with_frame_size(4);
        let mut generator = CountingGenerator {
            calls: 0,
            remaining: 6,
        };
        let mut output = [0i16; 16];
        let written = renderer.run(&mut generator, &mut output);

        assert_eq!(written, 8);
        assert_eq!(generator.calls, 2);
        assert!(generator.is_complete());
        assert_eq!(&output[..8], &[1; 8]);
        assert_eq!(&output[8..], &[0; 8]);
    }

    #[test]
    fn test_run_covers_whole_event() {
        let table = Wavetable::new(vec![500]).unwrap();
        let renderer = Renderer::new(&table, 44100).with_frame_size(3);
        let mut voice = WavetableVoice::new(&table, 440.0, 44100, DecayEnvelope::new(1.0, 1.0), 10);
        let mut output = [0i16; 10];
        assert_eq!(renderer.run(&mut voice, &mut output), 10);
        assert!(voice.is_complete());
        assert_eq!(output, [500; 10]);
    }

    #[test]
    fn test_too_long_is_rejected() {
        let table = Wavetable::default();
        let events = vec![event(60, 600), event(0, 600)];
        let renderer = Renderer::new(&table, 44100).with_max_samples(1000);
        assert_eq!(
            renderer.render(&events),
            Err(RenderError::TooLong {
                requested: 1200,
                limit: 1000
            })
        );
    }

    #[test]
    fn test_enormous_score_is_rejected_before_allocation() {
        let table = Wavetable::default();
        let events = vec![event(0, u32::MAX); 8];
        let renderer = Renderer::new(&table, 44100).with_max_samples(u32::MAX as usize);
        assert!(matches!(
            renderer.render(&events),
            Err(RenderError::TooLong { requested, .. }) if requested == 8 * u64::from(u32::MAX)
        ));
    }
}
