//! # mmlsynth
//!
//! Renders Music Macro Language scores to 16-bit PCM with a wavetable
//! oscillator and a per-sample exponential decay.
//!
//! - `pipeline`: MML parser, synthesis renderer and the orchestrating `Pipeline`
//! - `generator`: per-event signal generators (wavetable voice, silence, decay)
//! - `wavetable`: single-cycle tables, built-in or loaded from text
//! - `wav`: WAV file output
//!
//! ## Example
//!
//! ```
//! use mmlsynth::pipeline::{Pipeline, PipelineConfig};
//! use mmlsynth::wavetable::Wavetable;
//!
//! let pipeline = Pipeline::new(PipelineConfig::default(), Wavetable::default());
//! let pcm = pipeline.render_score("t120 o4 l8 c d e f g4").unwrap();
//! assert_eq!(pcm.len(), 4 * 11025 + 22050);
//! ```

pub mod error;
pub mod generator;
pub mod pipeline;
pub mod wav;
pub mod wavetable;

pub use error::Error;
pub use pipeline::{parse, render, NoteEvent, Pipeline, PipelineConfig};
pub use wavetable::Wavetable;
