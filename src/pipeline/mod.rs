//! MML rendering pipeline
//!
//! - Parser: turn MML text into timed note events
//! - Renderer: synthesize note events into 16-bit PCM
//! - Engine: configuration and the parse → render → WAV orchestrator

pub mod engine;
pub mod parser;
pub mod renderer;

pub use engine::{Pipeline, PipelineConfig};
pub use parser::{parse, NoteEvent, ParseError, Parser, ParserState, PitchClass};
pub use renderer::{render, RenderError, Renderer};
