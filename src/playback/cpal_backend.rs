//! [CpalBackend] sounds scheduled tones on the default output device through
//! [cpal](https://crates.io/crates/cpal).
//!
//! The backend clock counts frames rendered by the output stream. Registered
//! tones are sine voices in a shared mixer; the stream callback sums the
//! voices that are active at each frame, each shaped by its envelope.

use super::backend::{BackendError, SynthBackend};
use super::envelope::Envelope;
use super::types::{GainHandle, ScheduledTone, ToneEvent, ToneHandle};
use crate::config::OutputConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{error, info};
use std::f64::consts::TAU;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

struct MixerVoice {
    handle: ToneHandle,
    frequency: f64,
    start_frame: u64,
    end_frame: u64,
    envelope: Envelope,
}

/// Voices plus the frame clock, shared between the backend and the stream thread
struct Mixer {
    sample_rate: u32,
    frame: u64,
    voices: Vec<MixerVoice>,
}

impl Mixer {
    fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frame: 0,
            voices: Vec::new(),
        }
    }

    fn time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    fn to_frame(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate as f64).round() as u64
    }

    fn add(&mut self, handle: ToneHandle, event: &ToneEvent) {
        let voice = MixerVoice {
            handle,
            frequency: event.frequency,
            start_frame: self.to_frame(event.start_time),
            end_frame: self.to_frame(event.end_time()),
            envelope: event.envelope,
        };
        self.voices.push(voice);
    }

    fn stop(&mut self, handle: ToneHandle) -> Result<(), BackendError> {
        let frame = self.frame;
        // Finished voices are pruned, so a missing handle has already stopped
        let voice = self
            .voices
            .iter_mut()
            .find(|v| v.handle == handle)
            .ok_or(BackendError::AlreadyStopped(handle))?;
        if voice.end_frame <= frame {
            return Err(BackendError::AlreadyStopped(handle));
        }
        voice.end_frame = frame;
        Ok(())
    }

    fn next_sample(&mut self) -> f32 {
        let frame = self.frame;
        let sample_rate = self.sample_rate as f64;
        let mut value = 0.0;
        for voice in &self.voices {
            if frame >= voice.start_frame && frame < voice.end_frame {
                let t = (frame - voice.start_frame) as f64 / sample_rate;
                value += (TAU * voice.frequency * t).sin() * voice.envelope.gain_at(t);
            }
        }
        self.frame += 1;
        value.clamp(-1.0, 1.0) as f32
    }

    fn prune(&mut self) {
        let frame = self.frame;
        self.voices.retain(|v| v.end_frame > frame);
    }
}

fn write_frames<T>(output: &mut [T], channels: usize, mixer: &Mutex<Mixer>)
where
    T: SizedSample + FromSample<f32>,
{
    let mut mixer = match mixer.lock() {
        Ok(mixer) => mixer,
        Err(poisoned) => poisoned.into_inner(),
    };
    for frame in output.chunks_mut(channels) {
        let sample = T::from_sample(mixer.next_sample());
        for out in frame.iter_mut() {
            *out = sample;
        }
    }
    mixer.prune();
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mixer: &Arc<Mutex<Mixer>>,
) -> Result<Stream, BackendError>
where
    T: SizedSample + FromSample<f32>,
{
    let mixer = Arc::clone(mixer);
    let channels = config.channels as usize;
    device
        .build_output_stream(
            config,
            move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
                write_frames(output, channels, &mixer)
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| BackendError::Stream(e.to_string()))
}

/// Opens the default output device and starts a stream that renders `mixer`.
fn open_stream(
    mixer: &Arc<Mutex<Mixer>>,
    output: OutputConfig,
) -> Result<(Stream, u32), BackendError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| BackendError::Unavailable("no default output device".to_string()))?;
    let supported = device
        .default_output_config()
        .map_err(|e| BackendError::Unavailable(e.to_string()))?;

    let sample_format = supported.sample_format();
    let mut config: StreamConfig = supported.config();
    if let Some(frames) = output.buffer_size {
        config.buffer_size = BufferSize::Fixed(frames);
    }
    let sample_rate = config.sample_rate.0;
    match mixer.lock() {
        Ok(mut mixer) => mixer.sample_rate = sample_rate,
        Err(poisoned) => poisoned.into_inner().sample_rate = sample_rate,
    }

    let stream = match sample_format {
        SampleFormat::I8 => build_stream::<i8>(&device, &config, mixer),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer),
        SampleFormat::I32 => build_stream::<i32>(&device, &config, mixer),
        SampleFormat::U8 => build_stream::<u8>(&device, &config, mixer),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer),
        SampleFormat::U32 => build_stream::<u32>(&device, &config, mixer),
        SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer),
        SampleFormat::F64 => build_stream::<f64>(&device, &config, mixer),
        other => Err(BackendError::Stream(format!(
            "unsupported sample format {:?}",
            other
        ))),
    }?;
    stream
        .play()
        .map_err(|e| BackendError::Stream(e.to_string()))?;
    Ok((stream, sample_rate))
}

/// Output stream owner. cpal streams are not `Send`, so the stream is created
/// and kept alive on this thread until the backend is dropped.
fn run_stream(
    mixer: Arc<Mutex<Mixer>>,
    output: OutputConfig,
    ready: Sender<Result<u32, BackendError>>,
    quit: Receiver<()>,
) {
    match open_stream(&mixer, output) {
        Ok((stream, sample_rate)) => {
            let _ = ready.send(Ok(sample_rate));
            let _ = quit.recv();
            drop(stream);
        }
        Err(e) => {
            let _ = ready.send(Err(e));
        }
    }
}

/// Synthesis backend on the default audio output device
pub struct CpalBackend {
    mixer: Arc<Mutex<Mixer>>,
    next_handle: u64,
    quit: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl CpalBackend {
    /// Opens the default output device.
    ///
    /// # Errors
    /// [`BackendError::Unavailable`] when there is no output device, or
    /// [`BackendError::Stream`] when the stream cannot be built or started.
    pub fn open(output: &OutputConfig) -> Result<Self, BackendError> {
        let mixer = Arc::new(Mutex::new(Mixer::new(44_100)));
        let (ready_sender, ready_receiver) = bounded(1);
        let (quit_sender, quit_receiver) = bounded(1);

        let thread_mixer = Arc::clone(&mixer);
        let output = *output;
        let thread = std::thread::Builder::new()
            .name("jianpu-audio".to_string())
            .spawn(move || run_stream(thread_mixer, output, ready_sender, quit_receiver))
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let sample_rate = ready_receiver
            .recv()
            .map_err(|e| BackendError::Unavailable(e.to_string()))??;
        info!("Audio output running at {} Hz", sample_rate);

        Ok(Self {
            mixer,
            next_handle: 0,
            quit: quit_sender,
            thread: Some(thread),
        })
    }

    fn mixer(&self) -> Result<MutexGuard<'_, Mixer>, BackendError> {
        self.mixer
            .lock()
            .map_err(|_| BackendError::Stream("mixer lock poisoned".to_string()))
    }
}

impl SynthBackend for CpalBackend {
    fn current_time(&self) -> f64 {
        self.mixer().map(|mixer| mixer.time()).unwrap_or(0.0)
    }

    fn schedule_tone(&mut self, event: &ToneEvent) -> Result<ScheduledTone, BackendError> {
        let handle = ToneHandle(self.next_handle);
        self.next_handle += 1;
        self.mixer()?.add(handle, event);
        Ok(ScheduledTone {
            tone: handle,
            gain: GainHandle(handle.0),
            duration: event.duration,
        })
    }

    fn stop_tone(&mut self, tone: &ScheduledTone) -> Result<(), BackendError> {
        self.mixer()?.stop(tone.tone)
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        let _ = self.quit.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvelopeConfig;
    use crate::ids::NoteId;

    fn event(start_time: f64, duration: f64) -> ToneEvent {
        ToneEvent {
            note_id: NoteId(1),
            frequency: 440.0,
            start_time,
            duration,
            is_rest: false,
            envelope: Envelope::new(duration, &EnvelopeConfig::default()),
        }
    }

    #[test]
    fn test_mixer_is_silent_outside_voices() {
        let mut mixer = Mixer::new(1000);
        mixer.add(ToneHandle(0), &event(0.01, 0.1));
        for _ in 0..10 {
            assert_eq!(mixer.next_sample(), 0.0);
        }
        let sounding = (0..50).map(|_| mixer.next_sample()).any(|s| s != 0.0);
        assert!(sounding);
    }

    #[test]
    fn test_mixer_clock() {
        let mut mixer = Mixer::new(1000);
        for _ in 0..500 {
            mixer.next_sample();
        }
        assert_eq!(mixer.time(), 0.5);
    }

    #[test]
    fn test_mixer_stop() {
        let mut mixer = Mixer::new(1000);
        mixer.add(ToneHandle(0), &event(0.0, 0.1));
        mixer.next_sample();
        assert!(mixer.stop(ToneHandle(0)).is_ok());
        assert_eq!(mixer.stop(ToneHandle(0)), Err(BackendError::AlreadyStopped(ToneHandle(0))));
        assert_eq!(mixer.next_sample(), 0.0);

        mixer.prune();
        assert!(mixer.voices.is_empty());
        assert_eq!(mixer.stop(ToneHandle(0)), Err(BackendError::AlreadyStopped(ToneHandle(0))));
    }
}
