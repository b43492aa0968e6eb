//! Test signal generation and level metering.

use std::f64::consts::TAU;

/// A sine oscillator.
#[derive(Debug, Clone)]
pub(crate) struct Sine {
    phase: f64,
    step: f64,
    amplitude: f64,
}

impl Sine {
    pub(crate) fn new(frequency: f64, sample_rate: f64, amplitude: f64) -> Self {
        Self {
            phase: 0.0,
            step: TAU * frequency / sample_rate,
            amplitude,
        }
    }

    /// Next sample.
    pub(crate) fn next_sample(&mut self) -> f64 {
        let value = self.amplitude * self.phase.sin();
        self.phase = (self.phase + self.step) % TAU;
        value
    }

    /// Fill one block, the same signal on every channel.
    pub(crate) fn fill_f64(&mut self, channels: &mut [Vec<f64>]) {
        let frames = channels.first().map_or(0, Vec::len);
        for frame in 0..frames {
            let value = self.next_sample();
            for ch in channels.iter_mut() {
                if let Some(s) = ch.get_mut(frame) {
                    *s = value;
                }
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn fill_f32(&mut self, channels: &mut [Vec<f32>]) {
        let frames = channels.first().map_or(0, Vec::len);
        for frame in 0..frames {
            let value = self.next_sample() as f32;
            for ch in channels.iter_mut() {
                if let Some(s) = ch.get_mut(frame) {
                    *s = value;
                }
            }
        }
    }
}

/// Running peak level per channel.
#[derive(Debug, Clone, Default)]
pub(crate) struct PeakMeter {
    peaks: Vec<f64>,
}

impl PeakMeter {
    pub(crate) fn new(channels: usize) -> Self {
        Self {
            peaks: vec![0.0; channels],
        }
    }

    pub(crate) fn measure<T: Copy + Into<f64>>(&mut self, channels: &[Vec<T>]) {
        for (peak, ch) in self.peaks.iter_mut().zip(channels) {
            for s in ch {
                let level = (*s).into().abs();
                if level > *peak {
                    *peak = level;
                }
            }
        }
    }

    pub(crate) fn peaks(&self) -> &[f64] {
        &self.peaks
    }
}

/// Gain in decibels, floored at -144 dB.
pub(crate) fn to_db(gain: f64) -> f64 {
    if gain <= 0.0 {
        -144.0
    } else {
        (20.0 * gain.log10()).max(-144.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_peaks_at_its_amplitude() {
        let mut sine = Sine::new(1_000.0, 48_000.0, 0.5);
        let mut block = vec![vec![0.0_f64; 480]; 2];
        sine.fill_f64(&mut block);

        let mut meter = PeakMeter::new(2);
        meter.measure(&block);
        for peak in meter.peaks() {
            assert!((peak - 0.5).abs() < 1e-9);
        }
        assert_eq!(block[0], block[1]);
    }

    #[test]
    fn single_precision_matches_double() {
        let mut a = Sine::new(440.0, 44_100.0, 1.0);
        let mut b = a.clone();
        let mut single = vec![vec![0.0_f32; 64]];
        let mut double = vec![vec![0.0_f64; 64]];
        a.fill_f32(&mut single);
        b.fill_f64(&mut double);
        for (s, d) in single[0].iter().zip(&double[0]) {
            assert!((f64::from(*s) - d).abs() < 1e-6);
        }
    }

    #[test]
    fn decibels() {
        assert!((to_db(1.0)).abs() < 1e-12);
        assert!((to_db(0.5) + 6.0206).abs() < 1e-3);
        assert!((to_db(0.0) + 144.0).abs() < f64::EPSILON);
    }
}
