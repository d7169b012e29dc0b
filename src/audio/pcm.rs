/// Decoded audio (16-bit PCM, interleaved)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmAudio {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

impl PcmAudio {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Number of frames (one sample per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Playback length in milliseconds, rounded to nearest (ties to even)
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        round_half_even(self.frames() as u64 * 1000, self.sample_rate as u64)
    }

    /// Playback length in whole seconds, rounded from the millisecond length
    pub fn whole_seconds(&self) -> u32 {
        round_half_even(self.duration_ms(), 1000) as u32
    }

    /// Convert to the given sample rate and channel count.
    pub fn converted(self, sample_rate: u32, channels: u16) -> Self {
        let remixed = if self.channels != channels {
            Self::remix(self, channels)
        } else {
            self
        };

        if remixed.sample_rate != sample_rate {
            Self::resample(remixed, sample_rate)
        } else {
            remixed
        }
    }

    /// Append another buffer after this one. Both must share the same layout.
    pub fn append(&mut self, other: PcmAudio) {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        debug_assert_eq!(self.channels, other.channels);
        self.samples.extend(other.samples);
    }

    /// Change channel count: mono is duplicated, downmix averages
    fn remix(audio: PcmAudio, target_channels: u16) -> PcmAudio {
        let source_channels = audio.channels as usize;
        let target = target_channels as usize;
        if source_channels == 0 || target == 0 {
            return PcmAudio::new(Vec::new(), audio.sample_rate, target_channels);
        }

        let mut samples = Vec::with_capacity(audio.frames() * target);

        for frame in audio.samples.chunks_exact(source_channels) {
            if target == 1 {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                samples.push((sum / source_channels as i32) as i16);
            } else {
                for channel in 0..target {
                    samples.push(frame[channel.min(source_channels - 1)]);
                }
            }
        }

        PcmAudio::new(samples, audio.sample_rate, target_channels)
    }

    /// Linear-interpolation resampling
    fn resample(audio: PcmAudio, target_rate: u32) -> PcmAudio {
        let channels = audio.channels as usize;
        let source_frames = audio.frames();
        if audio.sample_rate == 0 || target_rate == 0 || channels == 0 || source_frames == 0 {
            return PcmAudio::new(Vec::new(), target_rate, audio.channels);
        }

        let target_frames = round_half_even(
            source_frames as u64 * target_rate as u64,
            audio.sample_rate as u64,
        ) as usize;
        let step = audio.sample_rate as f64 / target_rate as f64;
        let mut samples = Vec::with_capacity(target_frames * channels);

        for i in 0..target_frames {
            let position = i as f64 * step;
            let index = (position.floor() as usize).min(source_frames - 1);
            let next = (index + 1).min(source_frames - 1);
            let frac = position - index as f64;

            for channel in 0..channels {
                let a = audio.samples[index * channels + channel] as f64;
                let b = audio.samples[next * channels + channel] as f64;
                let value = a + (b - a) * frac;
                samples.push(value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16);
            }
        }

        PcmAudio::new(samples, target_rate, audio.channels)
    }
}

/// Integer division rounded to nearest, ties to even
pub(crate) fn round_half_even(numerator: u64, denominator: u64) -> u64 {
    let quotient = numerator / denominator;
    let twice_remainder = (numerator % denominator) * 2;

    if twice_remainder > denominator || (twice_remainder == denominator && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}
