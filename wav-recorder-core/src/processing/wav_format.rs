//! WAV container header encoding and in-place size backpatching.
//!
//! The recorder writes a placeholder header the moment a session starts and
//! rewrites the two size fields once the final PCM byte count is known.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::models::error::RecorderError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const PCM_FMT_CHUNK_SIZE: u32 = 16;
const PCM_FORMAT_CODE: u16 = 1;

/// Fixed-layout RIFF/WAVE header for an uncompressed PCM stream.
///
/// Layout (little-endian):
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    riff_size = file size - 8
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  num_channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * num_channels * bit_depth / 8
/// [32-33]  sample_alignment = num_channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_bytes
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_size: u32,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub data_bytes: u32,
}

impl WavHeader {
    /// Header with both size fields zeroed.
    pub fn placeholder(sample_rate: u32, bit_depth: u16, num_channels: u16) -> Self {
        Self {
            riff_size: 0,
            num_channels,
            sample_rate,
            bit_depth,
            data_bytes: 0,
        }
    }

    /// `None` when the product does not fit the 32-bit header field.
    pub fn byte_rate(&self) -> Option<u32> {
        self.sample_rate.checked_mul(self.sample_alignment()? as u32)
    }

    /// `None` when the product does not fit the 16-bit header field.
    pub fn sample_alignment(&self) -> Option<u16> {
        self.num_channels.checked_mul(self.bit_depth / 8)
    }

    fn derived_fields(&self) -> Result<(u32, u16), RecorderError> {
        match (self.byte_rate(), self.sample_alignment()) {
            (Some(byte_rate), Some(alignment)) => Ok((byte_rate, alignment)),
            _ => Err(RecorderError::InvalidHeader(format!(
                "{} Hz x {} channels x {}-bit overflows the byte rate field",
                self.sample_rate, self.num_channels, self.bit_depth
            ))),
        }
    }

    /// Set `data_bytes` and the RIFF size derived from it.
    pub fn set_data_size(&mut self, data_bytes: u64) -> Result<(), RecorderError> {
        let riff_size = data_bytes + (WAV_HEADER_SIZE as u64 - 8);
        if riff_size > u32::MAX as u64 {
            return Err(RecorderError::Io(format!(
                "{} data bytes exceed the 32-bit RIFF size limit",
                data_bytes
            )));
        }
        self.data_bytes = data_bytes as u32;
        self.riff_size = riff_size as u32;
        Ok(())
    }

    pub fn encode(&self) -> Result<[u8; WAV_HEADER_SIZE], RecorderError> {
        let (byte_rate, alignment) = self.derived_fields()?;
        let mut header = [0u8; WAV_HEADER_SIZE];

        // RIFF chunk descriptor
        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&self.riff_size.to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");

        // fmt sub-chunk
        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&PCM_FMT_CHUNK_SIZE.to_le_bytes());
        header[20..22].copy_from_slice(&PCM_FORMAT_CODE.to_le_bytes());
        header[22..24].copy_from_slice(&self.num_channels.to_le_bytes());
        header[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
        header[32..34].copy_from_slice(&alignment.to_le_bytes());
        header[34..36].copy_from_slice(&self.bit_depth.to_le_bytes());

        // data sub-chunk
        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&self.data_bytes.to_le_bytes());

        Ok(header)
    }

    /// Parse a header, checking the four tags and the PCM format fields.
    ///
    /// The stored byte rate and alignment are not trusted; they are always
    /// recomputed from sample rate, channels and bit depth, and a header whose
    /// recomputed values overflow their fields is rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecorderError> {
        if bytes.len() < WAV_HEADER_SIZE {
            return Err(RecorderError::InvalidHeader(format!(
                "expected {} bytes, got {}",
                WAV_HEADER_SIZE,
                bytes.len()
            )));
        }

        for (offset, tag) in [(0, b"RIFF"), (8, b"WAVE"), (12, b"fmt "), (36, b"data")] {
            if &bytes[offset..offset + 4] != tag {
                return Err(RecorderError::InvalidHeader(format!(
                    "missing {:?} tag at offset {}",
                    String::from_utf8_lossy(tag),
                    offset
                )));
            }
        }

        if read_u32(bytes, 16) != PCM_FMT_CHUNK_SIZE || read_u16(bytes, 20) != PCM_FORMAT_CODE {
            return Err(RecorderError::InvalidHeader("not an uncompressed PCM stream".into()));
        }

        let header = Self {
            riff_size: read_u32(bytes, 4),
            num_channels: read_u16(bytes, 22),
            sample_rate: read_u32(bytes, 24),
            bit_depth: read_u16(bytes, 34),
            data_bytes: read_u32(bytes, 40),
        };
        header.derived_fields()?;
        Ok(header)
    }
}

/// Write a full header with zeroed size fields.
///
/// On return the cursor sits immediately after the header, ready for PCM data.
pub fn write_placeholder_header<W: Write>(
    writer: &mut W,
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
) -> Result<(), RecorderError> {
    let header = WavHeader::placeholder(sample_rate, bit_depth, channels).encode()?;
    writer
        .write_all(&header)
        .map_err(|e| RecorderError::io("failed to write placeholder header", e))
}

/// Rewrite the two size fields of the header at offset 0.
///
/// The existing header is re-read so every other field is preserved, and the
/// cursor is restored to where it was. On failure the header is left in
/// whatever state the storage produced; treat that as data loss.
pub fn backpatch_sizes<F: Read + Write + Seek>(
    file: &mut F,
    total_data_bytes: u64,
) -> Result<WavHeader, RecorderError> {
    let resume_at = file
        .stream_position()
        .map_err(|e| RecorderError::io("failed to query position", e))?;

    let mut header = read_header(file)?;
    header.set_data_size(total_data_bytes)?;

    file.seek(SeekFrom::Start(0))
        .map_err(|e| RecorderError::io("failed to seek to header", e))?;
    let encoded = header.encode()?;
    file.write_all(&encoded)
        .map_err(|e| RecorderError::io("failed to rewrite header", e))?;
    file.flush()
        .map_err(|e| RecorderError::io("failed to flush header", e))?;

    file.seek(SeekFrom::Start(resume_at))
        .map_err(|e| RecorderError::io("failed to restore position", e))?;

    Ok(header)
}

/// Seek to the start of `reader` and decode the header found there.
pub fn read_header<R: Read + Seek>(reader: &mut R) -> Result<WavHeader, RecorderError> {
    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| RecorderError::io("failed to seek to header", e))?;
    let mut bytes = [0u8; WAV_HEADER_SIZE];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| RecorderError::io("failed to read header", e))?;
    WavHeader::decode(&bytes)
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    #[test]
    fn header_size_is_44_bytes() {
        let header = WavHeader::placeholder(16000, 16, 1).encode().unwrap();
        assert_eq!(header.len(), 44);
    }

    #[test]
    fn header_riff_magic() {
        let header = WavHeader::placeholder(16000, 16, 1).encode().unwrap();
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_pcm_format() {
        let header = WavHeader::placeholder(16000, 16, 1).encode().unwrap();
        assert_eq!(u16::from_le_bytes([header[20], header[21]]), 1);
        assert_eq!(u32::from_le_bytes([header[16], header[17], header[18], header[19]]), 16);
    }

    #[test]
    fn derived_fields_follow_inputs() {
        for sample_rate in [8000u32, 16000, 22050, 44100, 48000] {
            for bit_depth in [8u16, 16, 24, 32] {
                let header = WavHeader::placeholder(sample_rate, bit_depth, 1);
                assert_eq!(header.byte_rate(), Some(sample_rate * (bit_depth / 8) as u32));
                assert_eq!(header.sample_alignment(), Some(bit_depth / 8));

                let bytes = header.encode().unwrap();
                assert_eq!(Some(read_u32(&bytes, 28)), header.byte_rate());
                assert_eq!(Some(read_u16(&bytes, 32)), header.sample_alignment());
            }
        }
    }

    #[test]
    fn byte_rate_overflow_is_rejected_not_wrapped() {
        let header = WavHeader::placeholder(2_000_000_000, 32, 1);
        assert_eq!(header.byte_rate(), None);
        assert!(matches!(header.encode(), Err(RecorderError::InvalidHeader(_))));

        let mut out = Vec::new();
        assert!(write_placeholder_header(&mut out, u32::MAX, 16, 1).is_err());
        assert!(out.is_empty());

        // a file claiming an impossible rate is refused on decode
        let mut bytes = WavHeader::placeholder(16000, 32, 1).encode().unwrap();
        bytes[24..28].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            WavHeader::decode(&bytes),
            Err(RecorderError::InvalidHeader(_))
        ));
    }

    #[test]
    fn placeholder_has_zero_sizes() {
        let mut out = Vec::new();
        write_placeholder_header(&mut out, 16000, 16, 1).unwrap();
        assert_eq!(out.len(), WAV_HEADER_SIZE);
        assert_eq!(read_u32(&out, 4), 0);
        assert_eq!(read_u32(&out, 40), 0);
    }

    #[test]
    fn decode_rejects_short_and_foreign_headers() {
        assert!(matches!(
            WavHeader::decode(&[0u8; 20]),
            Err(RecorderError::InvalidHeader(_))
        ));

        let mut bytes = WavHeader::placeholder(16000, 16, 1).encode().unwrap();
        bytes[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(
            WavHeader::decode(&bytes),
            Err(RecorderError::InvalidHeader(_))
        ));

        let mut float = WavHeader::placeholder(16000, 32, 1).encode().unwrap();
        float[20..22].copy_from_slice(&3u16.to_le_bytes());
        assert!(WavHeader::decode(&float).is_err());
    }

    #[test]
    fn backpatch_sets_sizes_and_restores_position() {
        let mut file = Cursor::new(Vec::new());
        write_placeholder_header(&mut file, 16000, 16, 1).unwrap();
        file.write_all(&[0x11; 3200]).unwrap();
        let end = file.position();

        let header = backpatch_sizes(&mut file, 3200).unwrap();
        assert_eq!(header.data_bytes, 3200);
        assert_eq!(header.riff_size, 3236);
        assert_eq!(file.position(), end);

        let reparsed = read_header(&mut file).unwrap();
        assert_eq!(reparsed, header);
        assert_eq!(reparsed.sample_rate, 16000);
        assert_eq!(reparsed.bit_depth, 16);
        // PCM payload untouched
        assert!(file.get_ref()[WAV_HEADER_SIZE..].iter().all(|&b| b == 0x11));
    }

    #[test]
    fn backpatch_rejects_oversized_data() {
        let mut file = Cursor::new(Vec::new());
        write_placeholder_header(&mut file, 16000, 16, 1).unwrap();
        let result = backpatch_sizes(&mut file, u32::MAX as u64);
        assert!(matches!(result, Err(RecorderError::Io(_))));
        // header untouched
        assert_eq!(read_header(&mut file).unwrap().data_bytes, 0);
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn placeholder_write_failure_is_io_error() {
        let err = write_placeholder_header(&mut FailingWriter, 16000, 16, 1).unwrap_err();
        assert!(matches!(err, RecorderError::Io(msg) if msg.contains("disk full")));
    }

    #[test]
    fn backpatch_of_truncated_file_fails() {
        let mut file = Cursor::new(vec![0u8; 10]);
        assert!(matches!(backpatch_sizes(&mut file, 0), Err(RecorderError::Io(_))));
    }
}
