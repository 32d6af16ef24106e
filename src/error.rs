use crate::pipeline::{ParseError, RenderError};
use crate::wavetable::WavetableError;
use thiserror::Error;

/// Any failure of a full parse → render → write run
#[derive(Error, Debug)]
pub enum Error {
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("wavetable: {0}")]
    Wavetable(#[from] WavetableError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
