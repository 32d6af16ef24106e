//! WAV file writer utility
//!
//! Writes mono 16-bit PCM, the format produced by the renderer.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const HEADER_SIZE: u32 = 44;

/// Write a 16-bit PCM WAV file
///
/// # Arguments
/// * `path` - Output file path
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz (only for header)
///
/// # Example
/// ```no_run
/// use mmlsynth::wav::write_wav_16bit;
///
/// let samples = vec![0i16; 16000]; // 1 second of silence at 16kHz
/// write_wav_16bit("output.wav", &samples, 16000).unwrap();
/// ```
pub fn write_wav_16bit(path: impl AsRef<Path>, samples: &[i16], sample_rate: u32) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_wav(&mut writer, samples, sample_rate)?;
    writer.flush()
}

/// Write a complete 16-bit mono WAV stream to `writer`
pub fn write_wav<W: Write>(writer: &mut W, samples: &[i16], sample_rate: u32) -> io::Result<()> {
    let num_channels: u16 = 1; // Mono
    let bits_per_sample: u16 = 16;
    let block_align = num_channels * (bits_per_sample / 8);
    let byte_rate = sample_rate.checked_mul(u32::from(block_align)).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("sample rate {} Hz is too high for a WAV header", sample_rate),
        )
    })?;
    let data_size = u32::try_from(samples.len())
        .ok()
        .and_then(|n| n.checked_mul(2))
        .filter(|n| n.checked_add(HEADER_SIZE - 8).is_some())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} samples do not fit in a WAV file", samples.len()),
            )
        })?;
    let file_size = HEADER_SIZE - 8 + data_size;

    // RIFF chunk
    writer.write_all(b"RIFF")?;
    writer.write_all(&file_size.to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    // fmt subchunk
    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?; // Subchunk size
    writer.write_all(&1u16.to_le_bytes())?; // Audio format (PCM)
    writer.write_all(&num_channels.to_le_bytes())?;
    writer.write_all(&sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&bits_per_sample.to_le_bytes())?;

    // data subchunk
    writer.write_all(b"data")?;
    writer.write_all(&data_size.to_le_bytes())?;

    for sample in samples {
        writer.write_all(&sample.to_le_bytes())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_wav_silence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        write_wav_16bit(&path, &[0i16; 100], 16000).unwrap();

        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.len(), 44 + 200);
    }

    #[test]
    fn test_header_fields() {
        let mut data = Vec::new();
        write_wav(&mut data, &[1, -1, i16::MAX, i16::MIN], 44100).unwrap();

        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(&data[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes([data[20], data[21]]), 1); // PCM format
        assert_eq!(u16::from_le_bytes([data[22], data[23]]), 1); // Mono
        assert_eq!(
            u32::from_le_bytes([data[24], data[25], data[26], data[27]]),
            44100
        );
        assert_eq!(
            u32::from_le_bytes([data[28], data[29], data[30], data[31]]),
            88200
        ); // Byte rate
        assert_eq!(&data[36..40], b"data");
    }

    #[test]
    fn test_samples_are_little_endian() {
        let mut data = Vec::new();
        write_wav(&mut data, &[0x1234, -2, i16::MIN], 8000).unwrap();

        assert_eq!(&data[44..46], &[0x34, 0x12]);
        assert_eq!(i16::from_le_bytes([data[46], data[47]]), -2);
        assert_eq!(i16::from_le_bytes([data[48], data[49]]), i16::MIN);
    }

    #[test]
    fn test_rejects_sample_rate_overflowing_byte_rate() {
        let mut data = Vec::new();
        let err = write_wav(&mut data, &[0i16; 4], u32::MAX / 2 + 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(data.is_empty());

        write_wav(&mut data, &[0i16; 4], u32::MAX / 2).unwrap();
        assert_eq!(data.len(), 44 + 8);
    }

    #[test]
    fn test_chunk_sizes() {
        let mut data = Vec::new();
        let num_samples = 1000;
        write_wav(&mut data, &vec![0i16; num_samples], 16000).unwrap();

        let data_chunk_size = u32::from_le_bytes([data[40], data[41], data[42], data[43]]);
        assert_eq!(data_chunk_size, (num_samples * 2) as u32);

        let riff_chunk_size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        assert_eq!(riff_chunk_size, 36 + data_chunk_size);
        assert_eq!(data.len(), 44 + num_samples * 2);
    }
}
