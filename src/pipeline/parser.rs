//! Parser for Music Macro Language scores
//!
//! Format (case-insensitive, whitespace between tokens is ignored):
//! - Notes: `c d e f g a b` with optional `+`/`#` (sharp) or `-` (flat),
//!   optional length and trailing dots (e.g. `c+8.`, `b-2`)
//! - Explicit pitch: `n<number>` (MIDI-style note number)
//! - Rest: `r[length][.]`
//! - State: `o<n>` octave, `l<n>` default length, `t<n>` tempo,
//!   `v<n>` volume, `@<n>` instrument (ignored), `>`/`<` octave up/down
//! - Tie: `&` merges the following note into the previous event
//! - Track separator `,` and any other character are skipped
//!
//! An optional `MML@` prefix is stripped before parsing.

use log::{debug, info, warn};
use std::collections::TryReserveError;
use thiserror::Error;

pub const DEFAULT_OCTAVE: i32 = 4;
pub const DEFAULT_LENGTH: u32 = 4;
pub const DEFAULT_TEMPO: f64 = 120.0;
pub const DEFAULT_VOLUME: i32 = 100;
/// Amplitude multiplier applied after every sample of a note
pub const DEFAULT_DECAY_RATE: f64 = 0.99995;

/// Note number of middle C (`o4c`)
pub const MIDDLE_C: i32 = 60;

const SCORE_PREFIX: &str = "MML@";

/// A timed note or rest ready for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// MIDI-style pitch, `0` for a rest
    pub note_number: i32,
    /// Length of the event in samples
    pub duration_samples: u32,
    /// Volume at the time the event was created (100 = full scale)
    pub volume: i32,
    /// Per-sample amplitude decay factor
    pub decay_rate: f64,
}

impl NoteEvent {
    pub fn is_rest(&self) -> bool {
        self.note_number == 0
    }
}

/// Pitch letters of the natural scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl PitchClass {
    /// Semitones above C within one octave
    pub fn semitone(&self) -> i32 {
        match self {
            PitchClass::C => 0,
            PitchClass::D => 2,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::G => 7,
            PitchClass::A => 9,
            PitchClass::B => 11,
        }
    }

    /// Map a lowercase note letter to its pitch class
    pub fn from_letter(letter: u8) -> Option<Self> {
        match letter {
            b'c' => Some(PitchClass::C),
            b'd' => Some(PitchClass::D),
            b'e' => Some(PitchClass::E),
            b'f' => Some(PitchClass::F),
            b'g' => Some(PitchClass::G),
            b'a' => Some(PitchClass::A),
            b'b' => Some(PitchClass::B),
            _ => None,
        }
    }
}

/// Mutable parser settings read whenever a note or rest is created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParserState {
    pub octave: i32,
    /// Default note length as a denominator (4 = quarter note)
    pub length: u32,
    /// Beats (quarter notes) per minute
    pub tempo: f64,
    pub volume: i32,
    pub decay_rate: f64,
}

impl Default for ParserState {
    fn default() -> Self {
        Self {
            octave: DEFAULT_OCTAVE,
            length: DEFAULT_LENGTH,
            tempo: DEFAULT_TEMPO,
            volume: DEFAULT_VOLUME,
            decay_rate: DEFAULT_DECAY_RATE,
        }
    }
}

/// Parse errors
///
/// Syntax problems never fail a parse; only running out of memory does.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("out of memory while growing the event list: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

/// A note or rest token after length and dots are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NoteToken {
    note_number: i32,
    duration_samples: u32,
}

/// Single-pass MML scanner
///
/// Holds its own [`ParserState`], so independent parses never share state.
pub struct Parser<'a> {
    source: &'a [u8],
    position: usize,
    sample_rate: u32,
    state: ParserState,
    events: Vec<NoteEvent>,
}

impl<'a> Parser<'a> {
    /// Create a parser starting from the default state
    pub fn new(mml: &'a str, sample_rate: u32) -> Self {
        Self::with_state(mml, sample_rate, ParserState::default())
    }

    /// Create a parser starting from a custom initial state
    pub fn with_state(mml: &'a str, sample_rate: u32, state: ParserState) -> Self {
        let mml = mml.strip_prefix(SCORE_PREFIX).unwrap_or(mml);
        Self {
            source: mml.as_bytes(),
            position: 0,
            sample_rate,
            state,
            events: Vec::new(),
        }
    }

    /// Current parser state
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Scan the whole score and return the events in order
    pub fn parse(mut self) -> Result<Vec<NoteEvent>, ParseError> {
        while let Some(byte) = self.bump() {
            if byte.is_ascii_whitespace() {
                continue;
            }

            let command = byte.to_ascii_lowercase();
            match command {
                b'o' => {
                    if let Some(octave) = self.signed_numeral('o') {
                        self.state.octave = octave;
                    }
                }
                b'l' => match self.numeral() {
                    Some(0) => warn!("ignoring zero default length at byte {}", self.position),
                    Some(length) => self.state.length = length,
                    None => {}
                },
                b't' => match self.numeral() {
                    Some(0) => warn!("ignoring zero tempo at byte {}", self.position),
                    Some(tempo) => self.state.tempo = f64::from(tempo),
                    None => {}
                },
                b'v' => {
                    if let Some(volume) = self.signed_numeral('v') {
                        self.state.volume = volume;
                    }
                }
                b'@' => {
                    // No timbre selection, the wavetable is fixed for a render
                    self.numeral();
                }
                b'>' => self.state.octave = self.state.octave.saturating_add(1),
                b'<' => self.state.octave = self.state.octave.saturating_sub(1),
                b'a'..=b'g' | b'n' | b'r' => {
                    if let Some(token) = self.note_token(command) {
                        self.push(token)?;
                    }
                }
                b'&' => self.tie(),
                _ => {}
            }
        }

        info!("parsed {} events", self.events.len());
        Ok(self.events)
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Skip every byte the main loop would ignore
    fn skip_inert(&mut self) {
        while self.peek().is_some_and(|b| !is_command(b)) {
            self.position += 1;
        }
    }

    /// Consume a decimal numeral directly at the cursor
    ///
    /// Returns None when no digit follows. Overflowing numerals are consumed
    /// entirely but also yield None.
    fn numeral(&mut self) -> Option<u32> {
        let start = self.position;
        let mut value: Option<u32> = Some(0);
        while let Some(digit) = self.peek().filter(u8::is_ascii_digit) {
            value = value
                .and_then(|v| v.checked_mul(10))
                .and_then(|v| v.checked_add(u32::from(digit - b'0')));
            self.position += 1;
        }

        if self.position == start {
            return None;
        }
        if value.is_none() {
            warn!(
                "numeral {:?} at byte {} is out of range",
                String::from_utf8_lossy(&self.source[start..self.position]),
                start
            );
        }
        value
    }

    fn signed_numeral(&mut self, command: char) -> Option<i32> {
        let value = self.numeral()?;
        match i32::try_from(value) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("ignoring out of range argument {value} for '{command}'");
                None
            }
        }
    }

    fn dots(&mut self) -> u32 {
        let mut count = 0;
        while self.eat(b'.') {
            count += 1;
        }
        count
    }

    /// Parse the rest of a note/rest token whose command byte was consumed
    fn note_token(&mut self, command: u8) -> Option<NoteToken> {
        let (note_number, length) = match command {
            b'r' => (0, self.note_length()),
            b'n' => {
                let note = self.signed_numeral('n')?;
                (note, self.state.length)
            }
            letter => {
                let pitch = PitchClass::from_letter(letter)?;
                let mut note = MIDDLE_C
                    .saturating_add(self.state.octave.saturating_sub(DEFAULT_OCTAVE).saturating_mul(12))
                    .saturating_add(pitch.semitone());
                if self.eat(b'+') || self.eat(b'#') {
                    note = note.saturating_add(1);
                } else if self.eat(b'-') {
                    note = note.saturating_sub(1);
                }
                (note, self.note_length())
            }
        };

        let dots = self.dots();
        Some(NoteToken {
            note_number,
            duration_samples: self.duration(length, dots),
        })
    }

    /// Length numeral following a note, falling back to the default length
    fn note_length(&mut self) -> u32 {
        match self.numeral() {
            Some(0) => {
                warn!("note length 0 at byte {}, using l{}", self.position, self.state.length);
                self.state.length
            }
            Some(length) => length,
            None => self.state.length,
        }
    }

    /// Duration in samples of a note of the given length and dot count
    ///
    /// The k-th dot adds `base / 2^k`, always measured from the undotted base.
    fn duration(&self, length: u32, dots: u32) -> u32 {
        let seconds_per_quarter = 60.0 / self.state.tempo;
        let seconds_per_note = seconds_per_quarter * (4.0 / f64::from(length));
        let base = seconds_per_note * f64::from(self.sample_rate);

        let mut total = to_samples(base).max(1);
        let mut extension = base;
        for _ in 0..dots {
            extension /= 2.0;
            total = total.saturating_add(to_samples(extension));
        }
        total
    }

    fn push(&mut self, token: NoteToken) -> Result<(), ParseError> {
        self.events.try_reserve(1)?;
        let event = NoteEvent {
            note_number: token.note_number,
            duration_samples: token.duration_samples,
            volume: self.state.volume,
            decay_rate: self.state.decay_rate,
        };
        debug!("event {}: {:?}", self.events.len(), event);
        self.events.push(event);
        Ok(())
    }

    /// Extend the last event by the note following `&`
    ///
    /// Bytes with no command mapping are skipped on the way. Without a
    /// previous event, or when another command comes first, the tie is
    /// dropped and scanning resumes as usual.
    fn tie(&mut self) {
        if self.events.is_empty() {
            debug!("tie at byte {} has no preceding event", self.position);
            return;
        }

        self.skip_inert();
        let command = match self.peek().map(|b| b.to_ascii_lowercase()) {
            Some(c @ (b'a'..=b'g' | b'n' | b'r')) => c,
            _ => return,
        };
        self.position += 1;

        if let Some(token) = self.note_token(command) {
            if let Some(last) = self.events.last_mut() {
                last.duration_samples = last.duration_samples.saturating_add(token.duration_samples);
            }
        }
    }
}

/// Bytes that start a command in the main loop
fn is_command(byte: u8) -> bool {
    matches!(
        byte.to_ascii_lowercase(),
        b'a'..=b'g' | b'n' | b'r' | b'o' | b'l' | b't' | b'v' | b'@' | b'>' | b'<' | b'&'
    )
}

fn to_samples(exact: f64) -> u32 {
    // `as` saturates, so NaN becomes 0 and huge values u32::MAX
    exact.round() as u32
}

/// Parse an MML score into note events using the default parser state
///
/// # Example
/// ```
/// use mmlsynth::pipeline::parser::parse;
///
/// let events = parse("t120 l4 c d e r", 44100).unwrap();
/// assert_eq!(events.len(), 4);
/// assert_eq!(events[0].duration_samples, 22050);
/// ```
pub fn parse(mml: &str, sample_rate: u32) -> Result<Vec<NoteEvent>, ParseError> {
    Parser::new(mml, sample_rate).parse()
}
