//! Pipeline orchestrator
//!
//! Runs the two stages in sequence: MML text is parsed into note events,
//! the events are rendered against the configured wavetable, and the PCM
//! result is handed to a sink (a WAV file).

use crate::error::Error;
use crate::pipeline::parser::{NoteEvent, ParseError, Parser, ParserState};
use crate::pipeline::renderer::{RenderError, Renderer, DEFAULT_FRAME_SIZE, MAX_RENDER_SAMPLES};
use crate::wav::write_wav_16bit;
use crate::wavetable::Wavetable;
use log::info;
use std::path::Path;

/// Configuration for the audio pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of samples per frame
    pub frame_size: usize,
    /// Longest score (in samples) that will be rendered
    pub max_samples: usize,
    /// Parser state at the start of every score
    pub initial_state: ParserState,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            frame_size: DEFAULT_FRAME_SIZE,
            max_samples: MAX_RENDER_SAMPLES,
            initial_state: ParserState::default(),
        }
    }
}

/// Pipeline turning MML scores into PCM audio
pub struct Pipeline {
    config: PipelineConfig,
    wavetable: Wavetable,
}

impl Pipeline {
    /// Create a new pipeline
    ///
    /// # Arguments
    /// * `config` - Pipeline configuration
    /// * `wavetable` - Waveform used for every note
    pub fn new(config: PipelineConfig, wavetable: Wavetable) -> Self {
        Self { config, wavetable }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn wavetable(&self) -> &Wavetable {
        &self.wavetable
    }

    /// Parse a score at the configured sample rate
    pub fn parse(&self, mml: &str) -> Result<Vec<NoteEvent>, ParseError> {
        Parser::with_state(mml, self.config.sample_rate, self.config.initial_state).parse()
    }

    /// Render already parsed events
    pub fn render(&self, events: &[NoteEvent]) -> Result<Vec<i16>, RenderError> {
        Renderer::new(&self.wavetable, self.config.sample_rate)
            .with_frame_size(self.config.frame_size)
            .with_max_samples(self.config.max_samples)
            .render(events)
    }

    /// Parse and render a score
    pub fn render_score(&self, mml: &str) -> Result<Vec<i16>, Error> {
        let events = self.parse(mml)?;
        Ok(self.render(&events)?)
    }

    /// Render a score and write it to a WAV file
    ///
    /// # Arguments
    /// * `mml` - Score text
    /// * `output_path` - Path for output WAV file
    ///
    /// # Returns
    /// Number of samples written
    pub fn generate_wav(&self, mml: &str, output_path: impl AsRef<Path>) -> Result<usize, Error> {
        let samples = self.render_score(mml)?;
        write_wav_16bit(output_path.as_ref(), &samples, self.config.sample_rate)?;
        info!(
            "wrote {} samples to {}",
            samples.len(),
            output_path.as_ref().display()
        );
        Ok(samples.len())
    }
}
