use std::collections::VecDeque;
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use cpal::Sample;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::player::commands::{PlayerCommand, Timeline};

const POSITION_INTERVAL: Duration = Duration::from_millis(100);
const IDLE_SLEEP: Duration = Duration::from_millis(50);

struct AudioOutput {
    ring_buffer: Arc<Mutex<VecDeque<f32>>>,
    spec: SignalSpec,
    _stream: cpal::Stream,
}

impl AudioOutput {
    fn new(spec: SignalSpec) -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::Output("No output device available".to_string()))?;

        let config = cpal::StreamConfig {
            channels: spec.channels.count() as u16,
            sample_rate: cpal::SampleRate(spec.rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let buffer_capacity = spec.rate as usize * spec.channels.count() * 5;
        let ring_buffer = Arc::new(Mutex::new(VecDeque::with_capacity(buffer_capacity)));
        let ring_buffer_clone = ring_buffer.clone();

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut buffer) = ring_buffer_clone.lock() else {
                        data.fill(f32::EQUILIBRIUM);
                        return;
                    };
                    for sample in data.iter_mut() {
                        *sample = buffer.pop_front().unwrap_or(f32::EQUILIBRIUM);
                    }
                },
                |err| warn!(error = %err, "Audio stream error"),
                None,
            )
            .map_err(|e| EngineError::Output(e.to_string()))?;

        stream
            .play()
            .map_err(|e| EngineError::Output(e.to_string()))?;

        Ok(AudioOutput {
            ring_buffer,
            spec,
            _stream: stream,
        })
    }

    fn write_samples(&self, samples: &[f32]) {
        if let Ok(mut buffer) = self.ring_buffer.lock() {
            buffer.extend(samples.iter().copied());
        }
    }

    fn buffer_len(&self) -> usize {
        self.ring_buffer.lock().map(|b| b.len()).unwrap_or(0)
    }

    fn clear_buffer(&self) {
        if let Ok(mut buffer) = self.ring_buffer.lock() {
            buffer.clear();
        }
    }
}

struct PlaybackContext {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    audio_output: AudioOutput,
    sample_buf: SampleBuffer<f32>,
    total_frames_decoded: u64,
    total_duration: Duration,
    exhausted: bool,
}

impl PlaybackContext {
    /// Audible position: decoded frames minus what is still queued for output.
    fn position(&self) -> Duration {
        let channels = self.audio_output.spec.channels.count().max(1) as u64;
        let queued = self.audio_output.buffer_len() as u64 / channels;
        let played = self.total_frames_decoded.saturating_sub(queued);
        Duration::from_secs_f64(played as f64 / self.audio_output.spec.rate.max(1) as f64)
    }
}

enum Step {
    Continue,
    Finished,
}

pub fn spawn(
    cmd_rx: mpsc::Receiver<PlayerCommand>,
    event_tx: broadcast::Sender<EngineEvent>,
    timeline: Arc<Mutex<Timeline>>,
    epoch: Arc<AtomicU64>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut ctx: Option<PlaybackContext> = None;
        let mut last_position_update = Instant::now();

        loop {
            // Check for commands
            match cmd_rx.try_recv() {
                Ok(PlayerCommand::Load {
                    path,
                    epoch: requested,
                    reply,
                }) => {
                    if let Some(ref c) = ctx {
                        c.audio_output.clear_buffer();
                    }
                    ctx = None;
                    set_timeline(&timeline, Timeline::default());

                    if epoch.load(Ordering::SeqCst) != requested {
                        debug!(path = %path.display(), "Dropping superseded load");
                        let _ = reply.send(Err(EngineError::Superseded));
                        continue;
                    }

                    match load_audio(&path) {
                        Ok(new_ctx) => {
                            info!(
                                path = %path.display(),
                                duration = ?new_ctx.total_duration,
                                "Playback started"
                            );
                            set_timeline(
                                &timeline,
                                Timeline {
                                    position: Duration::ZERO,
                                    duration: new_ctx.total_duration,
                                },
                            );
                            ctx = Some(new_ctx);
                            let _ = reply.send(Ok(()));
                        }
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Failed to load audio");
                            let _ = reply.send(Err(e));
                        }
                    }
                }

                Ok(PlayerCommand::Stop { reply }) => {
                    if let Some(ref c) = ctx {
                        c.audio_output.clear_buffer();
                        debug!("Playback stopped");
                    }
                    ctx = None;
                    set_timeline(&timeline, Timeline::default());
                    let _ = reply.send(());
                }

                Err(TryRecvError::Empty) => {
                    // No command, continue
                }

                Err(TryRecvError::Disconnected) => {
                    // Engine is gone, exit
                    break;
                }
            }

            let step = match ctx.as_mut() {
                Some(c) => advance(c),
                None => {
                    // No playback, sleep to avoid busy loop
                    std::thread::sleep(IDLE_SLEEP);
                    continue;
                }
            };

            match step {
                Step::Continue => {
                    if let Some(ref c) = ctx {
                        if last_position_update.elapsed() >= POSITION_INTERVAL {
                            let current = Timeline {
                                position: c.position(),
                                duration: c.total_duration,
                            };
                            set_timeline(&timeline, current);
                            let _ = event_tx.send(EngineEvent::PositionChanged {
                                position: current.position,
                                duration: current.duration,
                            });
                            last_position_update = Instant::now();
                        }
                    }
                }
                Step::Finished => {
                    ctx = None;
                    set_timeline(&timeline, Timeline::default());
                    info!("Media item finished");
                    let _ = event_tx.send(EngineEvent::MediaItemFinished);
                }
            }
        }
    })
}

/// Decode one packet into the output buffer, or wait for the buffer to drain
/// once the stream is exhausted.
fn advance(c: &mut PlaybackContext) -> Step {
    if c.exhausted {
        if c.audio_output.buffer_len() == 0 {
            return Step::Finished;
        }
        std::thread::sleep(IDLE_SLEEP);
        return Step::Continue;
    }

    // Throttle if buffer is full
    let max_buffer = c.audio_output.spec.rate as usize * c.audio_output.spec.channels.count() * 3;
    if c.audio_output.buffer_len() > max_buffer {
        std::thread::sleep(Duration::from_millis(10));
        return Step::Continue;
    }

    match c.format.next_packet() {
        Ok(packet) => {
            if packet.track_id() != c.track_id {
                return Step::Continue;
            }

            match c.decoder.decode(&packet) {
                Ok(decoded) => {
                    let channels = c.audio_output.spec.channels.count();
                    let needed = decoded.capacity() * channels;
                    if needed > c.sample_buf.capacity() {
                        c.sample_buf =
                            SampleBuffer::new(decoded.capacity() as u64, *decoded.spec());
                    }
                    c.sample_buf.copy_interleaved_ref(decoded);
                    c.total_frames_decoded += (c.sample_buf.len() / channels.max(1)) as u64;
                    c.audio_output.write_samples(c.sample_buf.samples());
                    Step::Continue
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // Non-fatal, continue
                    debug!(error = e, "Skipping undecodable packet");
                    Step::Continue
                }
                Err(e) => {
                    warn!(error = %e, "Decoder failed, ending item");
                    c.exhausted = true;
                    Step::Continue
                }
            }
        }

        Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            c.exhausted = true;
            Step::Continue
        }

        Err(e) => {
            warn!(error = %e, "Read error, ending item");
            c.exhausted = true;
            Step::Continue
        }
    }
}

fn set_timeline(timeline: &Mutex<Timeline>, value: Timeline) {
    if let Ok(mut current) = timeline.lock() {
        *current = value;
    }
}

fn load_audio(path: &Path) -> Result<PlaybackContext, EngineError> {
    let codecs = symphonia::default::get_codecs();
    let probe = symphonia::default::get_probe();

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = probe.format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(EngineError::NoAudioTrack)?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let total_duration = codec_params
        .time_base
        .and_then(|tb| {
            codec_params.n_frames.map(|frames| {
                let time = tb.calc_time(frames);
                Duration::from_secs_f64(time.seconds as f64 + time.frac)
            })
        })
        .unwrap_or_default();

    let mut decoder = codecs.make(&codec_params, &DecoderOptions::default())?;

    // Decode packets until we get valid audio
    let (spec, first_samples) = loop {
        let packet = format.next_packet()?;

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let mut sample_buf = SampleBuffer::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                break (spec, sample_buf);
            }
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    };

    let audio_output = AudioOutput::new(spec)?;
    audio_output.write_samples(first_samples.samples());

    let initial_frames = first_samples.len() as u64 / spec.channels.count().max(1) as u64;

    Ok(PlaybackContext {
        format,
        decoder,
        track_id,
        audio_output,
        sample_buf: first_samples,
        total_frames_decoded: initial_frames,
        total_duration,
        exhausted: false,
    })
}
