//! Frequency-domain analysis for the visualizer.
//!
//! `SpectrumAnalyzer` holds a sliding window of the most recent capture
//! samples and produces one byte per frequency bin on demand: Hann window,
//! real FFT, magnitude smoothing (constant 0.8), then a dB mapping over
//! [-100, -30] dB onto 0..=255. Silence maps to 0.

use crate::audio::AudioFrame;
use realfft::num_complex::Complex32;
use realfft::{RealFftPlanner, RealToComplex};
use std::collections::VecDeque;
use std::sync::Arc;

const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;
const SMOOTHING: f32 = 0.8;

pub struct SpectrumAnalyzer {
    fft_size: usize,
    sample_rate: u32,
    r2c: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    ring: VecDeque<f32>,
    smoothed: Vec<f32>,
    spectrum: Vec<Complex32>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, sample_rate: u32) -> Self {
        let fft_size = fft_size.max(2);
        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let spectrum = r2c.make_output_vec();

        // Hann window
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let phase = std::f32::consts::TAU * i as f32 / fft_size as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        Self {
            fft_size,
            sample_rate,
            r2c,
            window,
            ring: VecDeque::with_capacity(fft_size),
            smoothed: vec![0.0; fft_size / 2],
            spectrum,
        }
    }

    /// One byte per bin; `fft_size / 2` bins.
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Center frequency of a bin in Hz.
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.fft_size as f32
    }

    /// Feed capture samples into the sliding window, downmixing interleaved
    /// channels to mono.
    pub fn push_frame(&mut self, frame: &AudioFrame) {
        let channels = usize::from(frame.channels.max(1));
        for chunk in frame.samples.chunks_exact(channels) {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            let mono = sum as f32 / channels as f32 / 32768.0;
            if self.ring.len() == self.fft_size {
                self.ring.pop_front();
            }
            self.ring.push_back(mono);
        }
    }

    /// Current byte-magnitude per bin.
    ///
    /// The window is zero-padded until enough samples have arrived, so early
    /// calls are valid and simply read low.
    pub fn byte_frequency_data(&mut self) -> Vec<u8> {
        let bins = self.frequency_bin_count();

        let mut input = vec![0.0f32; self.fft_size];
        let pad = self.fft_size - self.ring.len();
        for (i, &sample) in self.ring.iter().enumerate() {
            input[pad + i] = sample;
        }
        for (i, value) in input.iter_mut().enumerate() {
            *value *= self.window[i];
        }

        if self.r2c.process(&mut input, &mut self.spectrum).is_err() {
            return vec![0; bins];
        }

        let norm = 1.0 / self.fft_size as f32;
        let mut out = Vec::with_capacity(bins);
        for bin in 0..bins {
            let magnitude = self.spectrum[bin].norm() * norm;
            let smoothed = SMOOTHING * self.smoothed[bin] + (1.0 - SMOOTHING) * magnitude;
            self.smoothed[bin] = smoothed;

            let db = 20.0 * smoothed.max(1e-12).log10();
            let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB);
            out.push((scaled.clamp(0.0, 1.0) * 255.0) as u8);
        }
        out
    }

    /// Forget accumulated samples and smoothing state.
    pub fn reset(&mut self) {
        self.ring.clear();
        self.smoothed.iter_mut().for_each(|v| *v = 0.0);
    }
}
