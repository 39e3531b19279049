use std::io::Cursor;

use super::backend::{AudioChunk, CaptureBackend, CaptureError};

/// Default preference order: lossless formats first, lossy fallbacks last.
pub const DEFAULT_CODEC_PREFERENCE: &[&str] = &[
    "audio/wav",
    "audio/mpeg", // .mp3
    "audio/ogg",
    "audio/flac",
    "audio/mp4", // .m4a
    "audio/aac",
    "audio/webm;codecs=opus",
    "audio/webm",
];

/// Negotiated audio encoding, identified by its MIME type.
///
/// Chosen once per recording session; fixes both the capture encoding and
/// the filename extension used at upload time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codec {
    mime: String,
}

impl Codec {
    pub fn new(mime: impl Into<String>) -> Self {
        Self { mime: mime.into() }
    }

    /// The full MIME type, including any `;codecs=` parameter.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Filename extension for upload naming (`speech.<ext>`).
    ///
    /// The MIME subtype is normalized to the common extension: `mpeg`
    /// becomes `mp3`, the MPEG-4 container becomes `m4a`, codec parameters
    /// are stripped.
    pub fn extension(&self) -> String {
        let subtype = self.mime.split('/').nth(1).unwrap_or(&self.mime);
        let subtype = subtype.split(';').next().unwrap_or(subtype);
        match subtype {
            "mpeg" => "mp3",
            "mp4" | "x-m4a" => "m4a",
            other => other,
        }
        .to_string()
    }

    /// Whether chunks carry raw PCM that needs a WAV container at assembly.
    pub fn is_wav(&self) -> bool {
        self.extension() == "wav"
    }
}

/// Pick the first codec in the preference list the backend supports.
pub fn negotiate(
    backend: &dyn CaptureBackend,
    preferred: &[String],
) -> Result<Codec, CaptureError> {
    preferred
        .iter()
        .find(|mime| backend.supports_codec(mime))
        .map(|mime| Codec::new(mime.as_str()))
        .ok_or(CaptureError::NoSupportedCodec)
}

/// Assemble buffered chunks into one upload-ready byte blob.
///
/// Chunks from the wav codec are PCM 16-bit LE and get wrapped in a WAV
/// container; codecs that already produce containerized data are
/// concatenated in delivery order.
pub fn assemble(codec: &Codec, chunks: &[AudioChunk]) -> Result<Vec<u8>, CaptureError> {
    if chunks.is_empty() {
        return Err(CaptureError::EncodeError {
            reason: "no audio captured".to_string(),
        });
    }

    if codec.is_wav() {
        wrap_wav(chunks)
    } else {
        Ok(chunks.iter().flat_map(|c| c.data.iter().copied()).collect())
    }
}

fn wrap_wav(chunks: &[AudioChunk]) -> Result<Vec<u8>, CaptureError> {
    let first = &chunks[0];
    let spec = hound::WavSpec {
        channels: first.channels,
        sample_rate: first.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(|e| {
        CaptureError::EncodeError {
            reason: format!("failed to create WAV writer: {}", e),
        }
    })?;

    for chunk in chunks {
        for pair in chunk.data.chunks_exact(2) {
            let sample = i16::from_le_bytes([pair[0], pair[1]]);
            writer
                .write_sample(sample)
                .map_err(|e| CaptureError::EncodeError {
                    reason: format!("failed to write sample: {}", e),
                })?;
        }
    }

    writer.finalize().map_err(|e| CaptureError::EncodeError {
        reason: format!("failed to finalize WAV container: {}", e),
    })?;

    Ok(cursor.into_inner())
}
