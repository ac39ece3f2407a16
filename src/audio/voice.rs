use rand::Rng;

use super::dsp::{Cutoff, Filter, NoiseBuffer, Oscillator, Source, Waveform};
use super::envelope::Ramp;
use super::sound::{SoundDefinition, VoiceType};

// "silence" floor that exponential decays aim for
const FLOOR: f32 = 0.01;

// One signal chain inside a voice: sources summed, run through the filters
// in order, then scaled by the gain envelope. Layers can start late (clap).
#[derive(Debug)]
struct Layer {
    sources: Vec<Source>,
    filters: Vec<Filter>,
    gain: Ramp,
    start: u32, // frames after the voice starts
    len: u32,   // frames this layer sounds for
}

impl Layer {
    fn new(sources: Vec<Source>, gain: Ramp, seconds: f32, sample_rate: f32) -> Self {
        Self {
            sources,
            filters: Vec::new(),
            gain,
            start: 0,
            len: frames(seconds, sample_rate),
        }
    }

    fn through(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    fn delayed(mut self, seconds: f32, sample_rate: f32) -> Self {
        self.start = frames(seconds, sample_rate);
        self
    }

    fn end(&self) -> u32 {
        self.start + self.len
    }

    fn next(&mut self, pos: u32, sample_rate: f32) -> f32 {
        if pos < self.start || pos >= self.end() {
            return 0.0;
        }
        let t = (pos - self.start) as f32 / sample_rate;
        let mut x: f32 = self.sources.iter_mut().map(|s| s.next(t, sample_rate)).sum();
        for f in &mut self.filters {
            x = f.process(x, t);
        }
        x * self.gain.value_at(t)
    }
}

// An ephemeral signal graph for one triggered sound. Built off the audio
// thread, rendered by the engine until `finished`, then dropped.
#[derive(Debug)]
pub struct Voice {
    pub sound_id: &'static str,
    layers: Vec<Layer>,
    sample_rate: f32,
    pos: u32,
    len: u32,
}

impl Voice {
    fn new(sound_id: &'static str, layers: Vec<Layer>, sample_rate: f32) -> Self {
        let len = layers.iter().map(Layer::end).max().unwrap_or(0);
        Self { sound_id, layers, sample_rate, pos: 0, len }
    }

    #[cfg(test)]
    pub fn duration_frames(&self) -> u32 {
        self.len
    }

    pub fn duration_secs(&self) -> f32 {
        self.len as f32 / self.sample_rate
    }

    pub fn finished(&self) -> bool {
        self.pos >= self.len
    }

    // mixes this voice into `out` (mono, additive)
    pub fn render_into(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            if self.finished() {
                break;
            }
            let mut x = 0.0;
            for layer in &mut self.layers {
                x += layer.next(self.pos, self.sample_rate);
            }
            *sample += x;
            self.pos += 1;
        }
    }
}

fn frames(seconds: f32, sample_rate: f32) -> u32 {
    (seconds * sample_rate).round().max(0.0) as u32
}

fn osc(wave: Waveform, freq: f32) -> Source {
    Source::Osc(Oscillator::fixed(wave, freq))
}

fn swept(wave: Waveform, freq: Ramp) -> Source {
    Source::Osc(Oscillator::new(wave, freq))
}

// hold `level` then decay exponentially to the floor by `secs`
fn decay(level: f32, secs: f32) -> Ramp {
    Ramp::hold(level).exp_to(FLOOR, secs)
}

// Builds the graph for `def`. Every voice type has a fixed topology,
// envelope and duration; the definition only supplies pitch and LFO rate.
pub fn build<R: Rng + ?Sized>(def: &SoundDefinition, sample_rate: f32, rng: &mut R) -> Voice {
    use Waveform::*;

    let sr = sample_rate;
    let freq = |default: f32| def.base_frequency.unwrap_or(default);

    let layers = match def.voice {
        VoiceType::Bass => {
            let f = freq(55.0);
            vec![Layer::new(vec![osc(Sine, f), osc(Triangle, f * 2.0)], decay(0.8, 1.5), 1.5, sr)]
        }
        VoiceType::Wobble => {
            let lfo = Cutoff::Lfo {
                base: 500.0,
                depth: 400.0,
                rate: def.modulation_rate.unwrap_or(4.0),
            };
            vec![
                Layer::new(vec![osc(Sawtooth, freq(110.0))], decay(0.6, 2.0), 2.0, sr)
                    .through(Filter::lowpass(lfo, 10.0, sr)),
            ]
        }
        VoiceType::Kick => {
            let pitch = Ramp::hold(freq(60.0)).exp_to(0.01, 0.5);
            vec![Layer::new(vec![swept(Sine, pitch)], decay(1.0, 0.5), 0.5, sr)]
        }
        VoiceType::Snare => {
            let noise = Source::Noise(NoiseBuffer::white(rng, 0.3, sr));
            vec![
                Layer::new(vec![noise], decay(0.5, 0.2), 0.2, sr).through(Filter::highpass(2000.0, sr)),
                Layer::new(vec![osc(Triangle, freq(200.0))], decay(0.3, 0.1), 0.1, sr),
            ]
        }
        VoiceType::Clap => (0..3)
            .map(|i| {
                let noise = Source::Noise(NoiseBuffer::white(&mut *rng, 0.1, sr));
                Layer::new(vec![noise], decay(0.3, 0.1), 0.1, sr)
                    .through(Filter::bandpass(1000.0, 1.0, sr))
                    .delayed(i as f32 * 0.03, sr)
            })
            .collect(),
        VoiceType::Hihat => {
            let noise = Source::Noise(NoiseBuffer::white(rng, 0.05, sr));
            vec![Layer::new(vec![noise], decay(0.3, 0.05), 0.05, sr).through(Filter::highpass(freq(7000.0), sr))]
        }
        VoiceType::Perc => {
            let f = freq(800.0);
            let pitch = Ramp::hold(f).exp_to(f * 0.5, 0.1);
            vec![Layer::new(vec![swept(Sine, pitch)], decay(0.4, 0.1), 0.1, sr)]
        }
        VoiceType::Crash => {
            let noise = Source::Noise(NoiseBuffer::white(rng, 2.0, sr));
            vec![Layer::new(vec![noise], decay(0.3, 2.0), 2.0, sr).through(Filter::highpass(5000.0, sr))]
        }
        VoiceType::Synth => {
            let f = freq(261.63);
            // short linear attack so the note doesn't click
            let gain = Ramp::hold(0.0).linear_to(0.3, 0.02).exp_to(FLOOR, 0.5);
            vec![
                Layer::new(vec![osc(Sawtooth, f), osc(Square, f * 1.01)], gain, 0.5, sr)
                    .through(Filter::lowpass(Cutoff::Fixed(2000.0), 1.0, sr)),
            ]
        }
        VoiceType::Lead => {
            let f = freq(523.25);
            let cutoff = Cutoff::Sweep(Ramp::hold(f * 2.0).exp_to(f * 8.0, 0.1));
            vec![
                Layer::new(vec![osc(Sawtooth, f)], decay(0.4, 1.0), 1.0, sr)
                    .through(Filter::lowpass(cutoff, 10.0, sr)),
            ]
        }
        VoiceType::Pad => {
            let f = freq(130.81);
            let gain = Ramp::hold(0.0).linear_to(0.2, 0.1).linear_to(0.15, 1.9).linear_to(0.0, 2.0);
            vec![Layer::new(vec![osc(Sine, f), osc(Sine, f * 1.5), osc(Sine, f * 2.0)], gain, 2.0, sr)]
        }
        VoiceType::Vocal => {
            // two formant bands in series
            vec![
                Layer::new(vec![osc(Sawtooth, freq(300.0))], decay(0.3, 0.5), 0.5, sr)
                    .through(Filter::bandpass(800.0, 5.0, sr))
                    .through(Filter::bandpass(1200.0, 5.0, sr)),
            ]
        }
        VoiceType::Scratch => {
            let f = freq(200.0);
            let pitch = Ramp::hold(f).exp_to(f * 0.5, 0.15).exp_to(f * 1.5, 0.3);
            vec![
                Layer::new(vec![swept(Sawtooth, pitch)], Ramp::hold(0.3).linear_to(0.0, 0.3), 0.3, sr)
                    .through(Filter::lowpass(Cutoff::Fixed(1000.0), 1.0, sr)),
            ]
        }
        VoiceType::Riser => {
            let pitch = Ramp::hold(50.0).exp_to(2000.0, 2.0);
            let cutoff = Cutoff::Sweep(Ramp::hold(200.0).exp_to(5000.0, 2.0));
            vec![
                Layer::new(vec![swept(Sawtooth, pitch)], Ramp::hold(0.1).linear_to(0.4, 2.0), 2.0, sr)
                    .through(Filter::lowpass(cutoff, 1.0, sr)),
            ]
        }
        VoiceType::Impact => {
            let pitch = Ramp::hold(150.0).exp_to(40.0, 0.5);
            vec![Layer::new(vec![swept(Sine, pitch)], decay(1.0, 0.5), 0.5, sr)]
        }
        VoiceType::Sweep => {
            let pitch = Ramp::hold(2000.0).exp_to(200.0, 1.0);
            vec![Layer::new(vec![swept(Sine, pitch)], decay(0.3, 1.0), 1.0, sr)]
        }
        VoiceType::Reverse => {
            let pitch = Ramp::hold(1000.0).exp_to(100.0, 1.5);
            let cutoff = Cutoff::Sweep(Ramp::hold(5000.0).exp_to(500.0, 1.5));
            vec![
                Layer::new(vec![swept(Sawtooth, pitch)], Ramp::hold(0.0).linear_to(0.4, 1.5), 1.5, sr)
                    .through(Filter::lowpass(cutoff, 1.0, sr)),
            ]
        }
    };

    Voice::new(def.id, layers, sr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sound::SoundRegistry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SR: f32 = 8000.0;

    fn voice(id: &str) -> Voice {
        let reg = SoundRegistry::builtin();
        let mut rng = StdRng::seed_from_u64(1);
        build(reg.lookup(id).unwrap(), SR, &mut rng)
    }

    fn render(v: &mut Voice) -> Vec<f32> {
        let mut out = vec![0.0; v.duration_frames() as usize + 100];
        v.render_into(&mut out);
        out
    }

    fn peak(xs: &[f32]) -> f32 {
        xs.iter().fold(0.0f32, |m, x| m.max(x.abs()))
    }

    #[test]
    fn durations_match_voice_table() {
        let table = [
            ("bass1", 1.5),
            ("wobble1", 2.0),
            ("kick1", 0.5),
            ("snare1", 0.2),
            ("clap", 0.16),
            ("hihat1", 0.05),
            ("perc1", 0.1),
            ("crash", 2.0),
            ("synth1", 0.5),
            ("lead1", 1.0),
            ("pad1", 2.0),
            ("vocal1", 0.5),
            ("scratch", 0.3),
            ("fx1", 2.0),
            ("fx2", 0.5),
            ("fx3", 1.0),
            ("fx4", 1.5),
        ];
        for (id, secs) in table {
            let v = voice(id);
            assert!((v.duration_secs() - secs).abs() < 1e-3, "{id}: {}", v.duration_secs());
        }
    }

    #[test]
    fn every_builtin_sound_is_audible_and_bounded() {
        let reg = SoundRegistry::builtin();
        let mut rng = StdRng::seed_from_u64(3);
        for id in reg.ids() {
            let mut v = build(reg.lookup(id).unwrap(), SR, &mut rng);
            let out = render(&mut v);
            let p = peak(&out);
            assert!(p > 1e-3, "{id} is silent");
            assert!(p.is_finite() && p < 50.0, "{id} blew up: {p}");
            assert!(v.finished());
        }
    }

    #[test]
    fn renders_nothing_past_its_duration() {
        let mut v = voice("kick1");
        let out = render(&mut v);
        let end = v.duration_frames() as usize;
        assert!(out[end..].iter().all(|&s| s == 0.0));
        let mut more = [0.0f32; 64];
        v.render_into(&mut more);
        assert!(more.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn kick_decays() {
        let mut v = voice("kick1");
        let out = render(&mut v);
        let head = peak(&out[..400]);
        let tail = peak(&out[3600..4000]);
        assert!(head > 0.5);
        assert!(tail < head * 0.1);
    }

    #[test]
    fn reverse_swells_in() {
        let mut v = voice("fx4");
        let out = render(&mut v);
        let n = out.len();
        assert!(peak(&out[..800]) < peak(&out[n - 2000..n - 100]));
    }

    #[test]
    fn clap_layers_are_staggered() {
        let v = voice("clap");
        let starts: Vec<u32> = v.layers.iter().map(|l| l.start).collect();
        assert_eq!(starts, vec![0, 240, 480]);
    }

    #[test]
    fn render_is_additive() {
        let mut v = voice("bass1");
        let mut out = vec![1.0f32; 16];
        v.render_into(&mut out);
        // the first sample of a sine+triangle at phase 0 is -1 * 0.8 from the triangle
        assert!((out[0] - (1.0 - 0.8)).abs() < 1e-3);
    }
}
