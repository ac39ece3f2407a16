use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Q_BUTTERWORTH_F32};
use rand::Rng;

use super::envelope::Ramp;

// cutoff automation is re-evaluated this often (in samples), not every sample
pub const CONTROL_INTERVAL: u32 = 32;

const MIN_CUTOFF: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

impl Waveform {
    // phase in [0, 1)
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * std::f32::consts::TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Square => if phase < 0.5 { 1.0 } else { -1.0 },
        }
    }
}

#[derive(Clone, Debug)]
pub struct Oscillator {
    wave: Waveform,
    freq: Ramp,
    phase: f32,
}

impl Oscillator {
    pub fn new(wave: Waveform, freq: Ramp) -> Self {
        Self { wave, freq, phase: 0.0 }
    }

    pub fn fixed(wave: Waveform, freq: f32) -> Self {
        Self::new(wave, Ramp::hold(freq))
    }

    pub fn next(&mut self, t: f32, sample_rate: f32) -> f32 {
        let out = self.wave.sample(self.phase);
        self.phase += self.freq.value_at(t) / sample_rate;
        self.phase -= self.phase.floor(); // keep in [0, 1)
        out
    }
}

// A one-shot buffer of white noise, generated when the voice is built so the
// audio thread only ever reads it. Silent once exhausted.
#[derive(Clone, Debug)]
pub struct NoiseBuffer {
    data: Vec<f32>,
    pos: usize,
}

impl NoiseBuffer {
    pub fn white<R: Rng + ?Sized>(rng: &mut R, seconds: f32, sample_rate: f32) -> Self {
        let len = (seconds * sample_rate).round().max(0.0) as usize;
        let data = (0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
        Self { data, pos: 0 }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn next(&mut self) -> f32 {
        let s = self.data.get(self.pos).copied().unwrap_or(0.0);
        self.pos += 1;
        s
    }
}

#[derive(Clone, Debug)]
pub enum Source {
    Osc(Oscillator),
    Noise(NoiseBuffer),
}

impl Source {
    pub fn next(&mut self, t: f32, sample_rate: f32) -> f32 {
        match self {
            Source::Osc(osc) => osc.next(t, sample_rate),
            Source::Noise(noise) => noise.next(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

impl FilterKind {
    fn to_biquad(self) -> biquad::Type<f32> {
        match self {
            FilterKind::LowPass => biquad::Type::LowPass,
            FilterKind::HighPass => biquad::Type::HighPass,
            FilterKind::BandPass => biquad::Type::BandPass,
        }
    }
}

// Where a filter's cutoff comes from over the life of a voice
#[derive(Clone, Debug)]
pub enum Cutoff {
    Fixed(f32),
    Sweep(Ramp),
    // base +/- depth, moved by a sine LFO; the wobble
    Lfo { base: f32, depth: f32, rate: f32 },
}

impl Cutoff {
    fn at(&self, t: f32) -> f32 {
        match self {
            Cutoff::Fixed(f) => *f,
            Cutoff::Sweep(ramp) => ramp.value_at(t),
            Cutoff::Lfo { base, depth, rate } => {
                base + depth * (std::f32::consts::TAU * rate * t).sin()
            }
        }
    }

    fn varies(&self) -> bool {
        match self {
            Cutoff::Fixed(_) => false,
            Cutoff::Sweep(ramp) => !ramp.is_constant(),
            Cutoff::Lfo { .. } => true,
        }
    }
}

pub struct Filter {
    kind: FilterKind,
    cutoff: Cutoff,
    q: f32,
    sample_rate: f32,
    biquad: DirectForm2Transposed<f32>,
    countdown: u32,
}

impl Filter {
    pub fn new(kind: FilterKind, cutoff: Cutoff, q: f32, sample_rate: f32) -> Self {
        let initial = cutoff.at(0.0);
        // Fall back to a wide-open lowpass if even the clamped parameters are rejected.
        let coeffs = coefficients(kind, sample_rate, initial, q)
            .or_else(|| coefficients(FilterKind::LowPass, sample_rate, sample_rate * 0.45, Q_BUTTERWORTH_F32))
            .unwrap_or(Coefficients { a1: 0.0, a2: 0.0, b0: 1.0, b1: 0.0, b2: 0.0 });
        Self {
            kind,
            cutoff,
            q,
            sample_rate,
            biquad: DirectForm2Transposed::<f32>::new(coeffs),
            countdown: CONTROL_INTERVAL,
        }
    }

    pub fn lowpass(cutoff: Cutoff, q: f32, sample_rate: f32) -> Self {
        Self::new(FilterKind::LowPass, cutoff, q, sample_rate)
    }

    pub fn highpass(freq: f32, sample_rate: f32) -> Self {
        Self::new(FilterKind::HighPass, Cutoff::Fixed(freq), Q_BUTTERWORTH_F32, sample_rate)
    }

    pub fn bandpass(freq: f32, q: f32, sample_rate: f32) -> Self {
        Self::new(FilterKind::BandPass, Cutoff::Fixed(freq), q, sample_rate)
    }

    pub fn process(&mut self, x: f32, t: f32) -> f32 {
        if self.cutoff.varies() {
            self.countdown -= 1;
            if self.countdown == 0 {
                self.countdown = CONTROL_INTERVAL;
                // keep the old coefficients if the new ones are rejected
                if let Some(c) = coefficients(self.kind, self.sample_rate, self.cutoff.at(t), self.q) {
                    self.biquad.update_coefficients(c);
                }
            }
        }
        self.biquad.run(x)
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("kind", &self.kind)
            .field("cutoff", &self.cutoff)
            .field("q", &self.q)
            .finish()
    }
}

fn coefficients(kind: FilterKind, sample_rate: f32, cutoff: f32, q: f32) -> Option<Coefficients<f32>> {
    let nyquist_margin = sample_rate * 0.49;
    let f0 = cutoff.clamp(MIN_CUTOFF, nyquist_margin.max(MIN_CUTOFF));
    Coefficients::<f32>::from_params(kind.to_biquad(), sample_rate.hz(), f0.hz(), q.max(0.01)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SR: f32 = 8000.0;

    fn rms(xs: &[f32]) -> f32 {
        (xs.iter().map(|x| x * x).sum::<f32>() / xs.len() as f32).sqrt()
    }

    #[test]
    fn waveforms_stay_in_range() {
        for wave in [Waveform::Sine, Waveform::Triangle, Waveform::Sawtooth, Waveform::Square] {
            let mut osc = Oscillator::fixed(wave, 440.0);
            for i in 0..1000 {
                let s = osc.next(i as f32 / SR, SR);
                assert!((-1.0..=1.0).contains(&s), "{wave:?} produced {s}");
            }
        }
    }

    #[test]
    fn noise_buffer_runs_out() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut noise = NoiseBuffer::white(&mut rng, 0.05, SR);
        assert_eq!(noise.len(), 400);
        let heard: Vec<f32> = (0..400).map(|_| noise.next()).collect();
        assert!(rms(&heard) > 0.1);
        assert_eq!(noise.next(), 0.0);
    }

    #[test]
    fn highpass_attenuates_low_tone() {
        let mut osc = Oscillator::fixed(Waveform::Sine, 50.0);
        let mut hp = Filter::highpass(2000.0, SR);
        let out: Vec<f32> = (0..4000)
            .map(|i| {
                let t = i as f32 / SR;
                hp.process(osc.next(t, SR), t)
            })
            .collect();
        assert!(rms(&out[2000..]) < 0.05);
    }

    #[test]
    fn lfo_cutoff_swings_around_base() {
        let c = Cutoff::Lfo { base: 500.0, depth: 400.0, rate: 4.0 };
        assert!((c.at(0.0) - 500.0).abs() < 1e-3);
        assert!((c.at(1.0 / 16.0) - 900.0).abs() < 1e-2);
        assert!((c.at(3.0 / 16.0) - 100.0).abs() < 1e-2);
    }

    #[test]
    fn cutoff_above_nyquist_is_clamped_not_rejected() {
        assert!(coefficients(FilterKind::LowPass, SR, 20_000.0, 10.0).is_some());
        assert!(coefficients(FilterKind::HighPass, SR, 0.0, Q_BUTTERWORTH_F32).is_some());
    }
}
