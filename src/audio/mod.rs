pub mod backend;
pub mod codec;
pub mod microphone;

pub use backend::{
    AudioChunk, CaptureBackend, CaptureBackendFactory, CaptureConfig, CaptureError, CaptureSource,
};
pub use codec::{Codec, DEFAULT_CODEC_PREFERENCE};
pub use microphone::MicrophoneBackend;
