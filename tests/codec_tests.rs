// Unit tests for codec negotiation and artifact assembly

use std::io::Cursor;

use tokio::sync::mpsc;
use voice_route::audio::{codec, AudioChunk, CaptureBackend, CaptureError, Codec};

/// Backend that only answers codec-support queries.
struct FixedSupportBackend {
    supported: Vec<String>,
}

impl FixedSupportBackend {
    fn new(supported: &[&str]) -> Self {
        Self {
            supported: supported.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for FixedSupportBackend {
    fn supports_codec(&self, mime: &str) -> bool {
        self.supported.iter().any(|m| m == mime)
    }

    async fn start(&mut self, _codec: &Codec) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn preference(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn pcm_chunk(samples: &[i16], timestamp_ms: u64) -> AudioChunk {
    AudioChunk {
        data: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}

#[test]
fn test_extension_normalization() {
    assert_eq!(Codec::new("audio/wav").extension(), "wav");
    assert_eq!(Codec::new("audio/mpeg").extension(), "mp3");
    assert_eq!(Codec::new("audio/mp4").extension(), "m4a");
    assert_eq!(Codec::new("audio/x-m4a").extension(), "m4a");
    assert_eq!(Codec::new("audio/ogg").extension(), "ogg");
    assert_eq!(Codec::new("audio/webm;codecs=opus").extension(), "webm");
}

#[test]
fn test_negotiate_picks_first_supported() {
    let backend = FixedSupportBackend::new(&["audio/ogg", "audio/mpeg"]);
    let preferred = preference(&["audio/wav", "audio/mpeg", "audio/ogg"]);

    let codec = codec::negotiate(&backend, &preferred).expect("should negotiate");

    // wav is unsupported, mpeg comes before ogg in the preference order.
    assert_eq!(codec.mime(), "audio/mpeg");
}

#[test]
fn test_negotiate_respects_preference_order() {
    let backend = FixedSupportBackend::new(&["audio/wav", "audio/mpeg", "audio/ogg"]);
    let preferred = preference(&["audio/wav", "audio/mpeg", "audio/ogg"]);

    let codec = codec::negotiate(&backend, &preferred).expect("should negotiate");

    assert_eq!(codec.mime(), "audio/wav");
}

#[test]
fn test_negotiate_fails_when_nothing_supported() {
    let backend = FixedSupportBackend::new(&[]);
    let preferred = preference(&["audio/wav", "audio/mpeg"]);

    let result = codec::negotiate(&backend, &preferred);

    assert!(matches!(result, Err(CaptureError::NoSupportedCodec)));
}

#[test]
fn test_wav_assembly_produces_parseable_container() {
    let codec = Codec::new("audio/wav");
    let chunks = vec![pcm_chunk(&[1, -2, 3], 0), pcm_chunk(&[4, 5], 100)];

    let bytes = codec::assemble(&codec, &chunks).expect("should assemble");

    let mut reader = hound::WavReader::new(Cursor::new(bytes)).expect("should parse as WAV");
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 16000);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()
        .expect("samples should decode");
    assert_eq!(samples, vec![1, -2, 3, 4, 5]);
}

#[test]
fn test_compressed_assembly_concatenates_in_order() {
    let codec = Codec::new("audio/mpeg");
    let chunks = vec![
        AudioChunk {
            data: vec![1, 2],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: 0,
        },
        AudioChunk {
            data: vec![3, 4, 5],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: 100,
        },
    ];

    let bytes = codec::assemble(&codec, &chunks).expect("should assemble");

    assert_eq!(bytes, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_assemble_rejects_empty_recording() {
    let codec = Codec::new("audio/wav");

    let result = codec::assemble(&codec, &[]);

    assert!(matches!(result, Err(CaptureError::EncodeError { .. })));
}
