//! Tone synthesis
//!
//! Tones go straight to the hardware generator as a single command and are
//! timed on the caller's thread with plain sleeps. For very low pitches the
//! generator is unreliable, so a one-cycle PCM waveform is also produced.

use crate::buffer::{SampleBuffer, WAV_HEADER_LEN};
use crate::config::SoundConfig;
use crate::device::{send_best_effort, SoundCommand, SoundDevice};
use crate::volume::Volume;
use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;

/// Blocking pause used to time notes
pub trait Delay: Send + Sync {
    /// Block the calling thread for `ms` milliseconds
    fn delay_ms(&self, ms: u32);
}

/// [`Delay`] backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_ms(&self, ms: u32) {
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(u64::from(ms)));
        }
    }
}

/// Build one waveform cycle of `frequency_hz` as an 8-bit WAV buffer.
///
/// The 44-byte header is left zeroed; the driver skips it unread. A
/// non-positive frequency yields a header-only buffer.
pub fn freq_to_wav(frequency_hz: i32, sample_rate: u32) -> SampleBuffer {
    let chunk_len = if frequency_hz > 0 {
        (sample_rate / frequency_hz as u32) as usize
    } else {
        0
    };

    let mut data = vec![0u8; WAV_HEADER_LEN + chunk_len];
    let step = 2.0 * PI * f64::from(frequency_hz) / f64::from(sample_rate);
    for (i, sample) in data[WAV_HEADER_LEN..].iter_mut().enumerate() {
        let full_scale = ((step * i as f64).sin() * f64::from(i32::MAX)) as i32;
        // Keep the top byte, then bias signed to unsigned 8-bit
        *sample = ((full_scale >> 24) as i8 as u8) ^ 0x80;
    }

    SampleBuffer::from_raw(data)
}

/// Issues tone and stop commands and times them
pub struct ToneSynth {
    device: Arc<dyn SoundDevice>,
    volume: Arc<Volume>,
    delay: Arc<dyn Delay>,
    sample_rate: u32,
    note_pause_ms: i32,
    low_frequency_threshold_hz: i32,
    latch_delay_ms: u32,
}

impl ToneSynth {
    /// Create a synthesizer writing to `device`
    pub fn new(
        config: &SoundConfig,
        device: Arc<dyn SoundDevice>,
        volume: Arc<Volume>,
        delay: Arc<dyn Delay>,
    ) -> Self {
        ToneSynth {
            device,
            volume,
            delay,
            sample_rate: config.sample_rate,
            note_pause_ms: i32::try_from(config.note_pause_ms).unwrap_or(i32::MAX),
            low_frequency_threshold_hz: config.low_frequency_threshold_hz,
            latch_delay_ms: config.latch_delay_ms,
        }
    }

    /// Play `frequency_hz` for `duration_ms` and block until the note is over.
    ///
    /// - `frequency_hz <= 0` stops the output, then rests for `duration_ms`
    ///   if it is non-negative
    /// - `duration_ms <= 0` starts a free-running tone and returns at once
    /// - otherwise the tone is held for `duration_ms - note pause` (at least
    ///   1 ms) and the call returns after the whole note plus rest
    ///
    /// Pitches below the low-frequency threshold also get a one-cycle
    /// waveform, returned to the caller alongside the direct tone.
    pub fn play_tone(&self, frequency_hz: i32, duration_ms: i32) -> Option<SampleBuffer> {
        let waveform = (frequency_hz > 0 && frequency_hz < self.low_frequency_threshold_hz)
            .then(|| freq_to_wav(frequency_hz, self.sample_rate));

        if frequency_hz <= 0 {
            self.stop();
            if duration_ms >= 0 {
                self.delay.delay_ms(duration_ms as u32);
            }
        } else if duration_ms > 0 {
            let held = duration_ms.saturating_sub(self.note_pause_ms).max(1);
            let rest = (duration_ms - held).max(1);
            self.send_tone(frequency_hz as u32, held as u32);
            self.delay.delay_ms((held + rest) as u32);
        } else {
            // Rings until the next stop
            self.send_tone(frequency_hz as u32, 0);
        }

        self.delay.delay_ms(self.latch_delay_ms);
        waveform
    }

    /// Silence the output
    pub fn stop(&self) {
        send_best_effort(self.device.as_ref(), &SoundCommand::Stop);
    }

    /// One-cycle waveform at the configured sample rate
    pub fn freq_to_wav(&self, frequency_hz: i32) -> SampleBuffer {
        freq_to_wav(frequency_hz, self.sample_rate)
    }

    fn send_tone(&self, frequency_hz: u32, duration_ms: u32) {
        let command = SoundCommand::tone(self.volume.percent(), frequency_hz, duration_ms);
        log::debug!("tone {} Hz for {} ms", frequency_hz, duration_ms);
        send_best_effort(self.device.as_ref(), &command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use approx::assert_abs_diff_eq;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        frames: Mutex<Vec<SoundCommand>>,
        delays: Mutex<Vec<u32>>,
    }

    impl SoundDevice for Recorder {
        fn write_command(&self, frame: &[u8]) -> Result<usize> {
            self.frames.lock().push(SoundCommand::decode(frame)?);
            Ok(frame.len())
        }
    }

    impl Delay for Recorder {
        fn delay_ms(&self, ms: u32) {
            self.delays.lock().push(ms);
        }
    }

    fn synth(recorder: &Arc<Recorder>, volume_percent: u8) -> ToneSynth {
        ToneSynth::new(
            &SoundConfig::default(),
            recorder.clone(),
            Arc::new(Volume::new(volume_percent)),
            recorder.clone(),
        )
    }

    #[test]
    fn test_timed_tone_leaves_note_pause() {
        let recorder = Arc::new(Recorder::default());
        let waveform = synth(&recorder, 40).play_tone(440, 500);

        assert!(waveform.is_none());
        assert_eq!(
            *recorder.frames.lock(),
            vec![SoundCommand::Tone {
                volume: 40,
                frequency: 440,
                duration: 480
            }]
        );
        assert_eq!(*recorder.delays.lock(), vec![500, 1]);
    }

    #[test]
    fn test_short_tone_holds_at_least_one_ms() {
        let recorder = Arc::new(Recorder::default());
        synth(&recorder, 40).play_tone(880, 5);

        assert_eq!(
            *recorder.frames.lock(),
            vec![SoundCommand::Tone {
                volume: 40,
                frequency: 880,
                duration: 1
            }]
        );
        assert_eq!(*recorder.delays.lock(), vec![5, 1]);
    }

    #[test]
    fn test_silence_stops_and_rests() {
        let recorder = Arc::new(Recorder::default());
        let synth = synth(&recorder, 40);
        synth.play_tone(0, 250);
        synth.play_tone(-10, -1);

        assert_eq!(
            *recorder.frames.lock(),
            vec![SoundCommand::Stop, SoundCommand::Stop]
        );
        assert_eq!(*recorder.delays.lock(), vec![250, 1, 1]);
    }

    #[test]
    fn test_untimed_tone_rings() {
        let recorder = Arc::new(Recorder::default());
        synth(&recorder, 75).play_tone(1000, 0);

        assert_eq!(
            *recorder.frames.lock(),
            vec![SoundCommand::Tone {
                volume: 75,
                frequency: 1000,
                duration: 0
            }]
        );
        assert_eq!(*recorder.delays.lock(), vec![1]);
    }

    #[test]
    fn test_oversized_note_pause_saturates() {
        let recorder = Arc::new(Recorder::default());
        let config = SoundConfig {
            note_pause_ms: u32::MAX,
            ..SoundConfig::default()
        };
        let synth = ToneSynth::new(
            &config,
            recorder.clone(),
            Arc::new(Volume::new(40)),
            recorder.clone(),
        );
        synth.play_tone(440, i32::MAX);

        assert_eq!(
            *recorder.frames.lock(),
            vec![SoundCommand::Tone {
                volume: 40,
                frequency: 440,
                duration: 1
            }]
        );
        assert_eq!(*recorder.delays.lock(), vec![i32::MAX as u32, 1]);
    }

    #[test]
    fn test_low_frequency_tone_also_builds_waveform() {
        let recorder = Arc::new(Recorder::default());
        let waveform = synth(&recorder, 40).play_tone(200, 100).unwrap();

        assert_eq!(waveform.len(), WAV_HEADER_LEN + 40);
        assert_eq!(recorder.frames.lock().len(), 1);
    }

    #[test]
    fn test_freq_to_wav_one_cycle() {
        let buffer = freq_to_wav(100, 8000);
        assert_eq!(buffer.len(), WAV_HEADER_LEN + 80);
        assert!(buffer.as_bytes()[..WAV_HEADER_LEN].iter().all(|&b| b == 0));

        let payload = buffer.payload();
        assert_eq!(payload[0], 0x80);
        assert_eq!(payload[20], 0xFF);
        assert_eq!(payload[60], 0x00);

        for (i, &sample) in payload.iter().enumerate() {
            let expected = (2.0 * PI * 100.0 * i as f64 / 8000.0).sin();
            let decoded = (f64::from(sample) - 128.0) / 128.0;
            assert_abs_diff_eq!(decoded, expected, epsilon = 1.0 / 64.0);
        }
    }

    #[test]
    fn test_freq_to_wav_degenerate_frequencies() {
        assert_eq!(freq_to_wav(0, 8000).len(), WAV_HEADER_LEN);
        assert_eq!(freq_to_wav(-50, 8000).len(), WAV_HEADER_LEN);
        assert_eq!(freq_to_wav(9000, 8000).len(), WAV_HEADER_LEN);
    }
}
