use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::backend::{AudioChunk, CaptureBackend, CaptureConfig, CaptureError};
use super::codec::Codec;

type PendingBuffer = Arc<Mutex<Vec<u8>>>;

/// Default-input-device capture backend.
///
/// The cpal stream is not `Send`, so it lives on a dedicated thread that is
/// told to shut down through a control channel. Samples cross to the async
/// side as PCM 16-bit LE chunks, which is why this backend only offers the
/// wav codec.
pub struct MicrophoneBackend {
    config: CaptureConfig,
    control_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
    capturing: bool,
}

impl MicrophoneBackend {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            control_tx: None,
            thread: None,
            capturing: false,
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for MicrophoneBackend {
    fn supports_codec(&self, mime: &str) -> bool {
        mime.eq_ignore_ascii_case("audio/wav")
    }

    async fn start(&mut self, codec: &Codec) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        if self.capturing {
            return Err(CaptureError::DeviceError {
                reason: "capture already running".to_string(),
            });
        }
        if !self.supports_codec(codec.mime()) {
            return Err(CaptureError::DeviceError {
                reason: format!("microphone backend cannot encode {}", codec.mime()),
            });
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(100);
        let (control_tx, control_rx) = std_mpsc::channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let config = self.config.clone();
        let thread =
            std::thread::spawn(move || capture_thread(config, chunk_tx, control_rx, ready_tx));

        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                return Err(CaptureError::DeviceError {
                    reason: "capture thread exited during setup".to_string(),
                });
            }
        }

        self.control_tx = Some(control_tx);
        self.thread = Some(thread);
        self.capturing = true;
        info!("Microphone capture started");

        Ok(chunk_rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.capturing {
            return Ok(());
        }
        self.capturing = false;

        if let Some(control_tx) = self.control_tx.take() {
            let _ = control_tx.send(());
        }

        if let Some(handle) = self.thread.take() {
            let join = tokio::task::spawn_blocking(move || handle.join()).await;
            match join {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    return Err(CaptureError::DeviceError {
                        reason: "capture thread panicked".to_string(),
                    })
                }
                Err(e) => {
                    return Err(CaptureError::DeviceError {
                        reason: format!("failed to join capture thread: {}", e),
                    })
                }
            }
        }

        info!("Microphone capture stopped");
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

/// Owns the cpal stream for the lifetime of one recording.
///
/// Blocks on the control channel until stopped, then flushes the partial
/// tail chunk so the end of the utterance is kept. Dropping `chunk_tx` on
/// exit closes the chunk channel, which is the stop signal for consumers.
fn capture_thread(
    config: CaptureConfig,
    chunk_tx: mpsc::Sender<AudioChunk>,
    control_rx: std_mpsc::Receiver<()>,
    ready_tx: oneshot::Sender<Result<(), CaptureError>>,
) {
    let started = Instant::now();

    let (stream, pending, sample_rate) = match build_stream(&config, chunk_tx.clone(), started) {
        Ok(parts) => parts,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(CaptureError::DeviceError {
            reason: e.to_string(),
        }));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    // A closed control channel counts as a stop signal too.
    let _ = control_rx.recv();
    drop(stream);

    let tail = {
        let mut buf = match pending.lock() {
            Ok(buf) => buf,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::take(&mut *buf)
    };
    if !tail.is_empty() {
        let chunk = AudioChunk {
            data: tail,
            sample_rate,
            channels: config.target_channels,
            timestamp_ms: started.elapsed().as_millis() as u64,
        };
        if chunk_tx.blocking_send(chunk).is_err() {
            warn!("Consumer gone before the tail chunk could be delivered");
        }
    }
}

fn build_stream(
    config: &CaptureConfig,
    chunk_tx: mpsc::Sender<AudioChunk>,
    started: Instant,
) -> Result<(cpal::Stream, PendingBuffer, u32), CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| CaptureError::PermissionDenied {
            reason: "no input device available".to_string(),
        })?;

    info!("Input device: {:?}", device.description());

    let default_config = device
        .default_input_config()
        .map_err(|e| CaptureError::PermissionDenied {
            reason: e.to_string(),
        })?;

    if default_config.sample_format() != cpal::SampleFormat::F32 {
        return Err(CaptureError::DeviceError {
            reason: format!(
                "unsupported sample format {:?}",
                default_config.sample_format()
            ),
        });
    }

    // Decimate from the native rate down to roughly the target rate.
    let native_rate = default_config.sample_rate();
    let factor = (native_rate / config.target_sample_rate).max(1) as usize;
    let actual_rate = native_rate / factor as u32;
    if factor > 1 {
        info!(
            "Using native rate {}Hz, downsampling by {}x to ~{}Hz",
            native_rate, factor, actual_rate
        );
    }

    let stream_config = default_config.config();
    let channels = stream_config.channels as usize;
    let samples_per_chunk = (actual_rate as u64 * config.chunk_duration_ms / 1000).max(1) as usize;
    let target_channels = config.target_channels;

    let pending: PendingBuffer = Arc::new(Mutex::new(Vec::new()));
    let cb_pending = Arc::clone(&pending);

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mut buf = match cb_pending.lock() {
                    Ok(buf) => buf,
                    Err(poisoned) => poisoned.into_inner(),
                };
                for (i, frame) in data.chunks(channels).enumerate() {
                    if i % factor == 0 {
                        let mono = frame.iter().sum::<f32>() / channels as f32;
                        let sample = (mono.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                        buf.extend_from_slice(&sample.to_le_bytes());
                    }
                }
                if buf.len() >= samples_per_chunk * 2 {
                    let data = std::mem::take(&mut *buf);
                    drop(buf);
                    let chunk = AudioChunk {
                        data,
                        sample_rate: actual_rate,
                        channels: target_channels,
                        timestamp_ms: started.elapsed().as_millis() as u64,
                    };
                    if chunk_tx.try_send(chunk).is_err() {
                        warn!("Dropping audio chunk: channel full or closed");
                    }
                }
            },
            |err| error!("Input stream error: {}", err),
            None,
        )
        .map_err(|e| CaptureError::DeviceError {
            reason: e.to_string(),
        })?;

    Ok((stream, pending, actual_rate))
}
