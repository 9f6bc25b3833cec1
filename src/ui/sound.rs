/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::domain::rules::Outcome;
use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = 2.0 * std::f32::consts::PI;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_start: Arc<Vec<u8>>,
        sfx_jump: Arc<Vec<u8>>,
        sfx_pass: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
        sfx_lose: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("audio output unavailable: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_start: Arc::new(make_wav(&gen_start())),
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_pass: Arc::new(make_wav(&gen_blip(1320.0, 0.04, 0.18))),
                sfx_win: Arc::new(make_wav(&gen_win())),
                sfx_lose: Arc::new(make_wav(&gen_lose())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_start(&self) { self.play(&self.sfx_start); }
        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_pass(&self) { self.play(&self.sfx_pass); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
        pub fn play_lose(&self) { self.play(&self.sfx_lose); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Sequence of notes, sine + harmonics, each with a short decay.
    fn gen_notes(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * TAU).sin() * 0.7
                    + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Start: two quick rising notes
    fn gen_start() -> Vec<f32> {
        gen_notes(&[523.0, 784.0], 0.06, 0.25) // C5, G5
    }

    /// Jump: upward sweep
    fn gen_jump() -> Vec<f32> {
        let duration = 0.14;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 300.0 + t * 600.0; // 300Hz → 900Hz
                phase += freq / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.6);
                // Square-ish wave for retro feel
                let wave = if (phase * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                wave * env * 0.15
            })
            .collect()
    }

    /// Win: ascending fanfare with a held last note
    fn gen_win() -> Vec<f32> {
        let mut samples = gen_notes(&[523.0, 659.0, 784.0, 1047.0], 0.1, 0.3); // C5→E5→G5→C6
        let last_freq = 1047.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.25) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            samples.push((t * last_freq * TAU).sin() * env * 0.3);
        }
        samples
    }

    /// Lose: noisy thud then a sad descending line
    fn gen_lose() -> Vec<f32> {
        let thud_n = (SAMPLE_RATE as f32 * 0.08) as usize;
        let mut rng: u32 = 12345;
        let mut samples: Vec<f32> = (0..thud_n)
            .map(|i| {
                let t = i as f32 / thud_n as f32;
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                noise * (1.0 - t) * 0.35
            })
            .collect();
        samples.extend(gen_notes(&[440.0, 370.0, 311.0, 261.0], 0.12, 0.3)); // A4→F#4→Eb4→C4

        // Final fade
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for (i, s) in samples.iter_mut().enumerate().skip(total - fade_len) {
            *s *= (total - i) as f32 / fade_len as f32;
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_and_length() {
            let samples = gen_jump();
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
        }

        #[test]
        fn generated_samples_stay_in_range() {
            for samples in [gen_start(), gen_jump(), gen_win(), gen_lose()] {
                assert!(!samples.is_empty());
                assert!(samples.iter().all(|s| s.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_start(&self) {}
    pub fn play_jump(&self) {}
    pub fn play_pass(&self) {}
    pub fn play_win(&self) {}
    pub fn play_lose(&self) {}
}

/// Play the effect for each session event, if audio is available.
pub fn play_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Started => sfx.play_start(),
            GameEvent::Jumped => sfx.play_jump(),
            GameEvent::BarrierPassed { .. } => sfx.play_pass(),
            GameEvent::Ended(Outcome::Win) => sfx.play_win(),
            GameEvent::Ended(Outcome::Loss) => sfx.play_lose(),
            GameEvent::Landed => {}
        }
    }
}
