// Parameter automation, shaped like the web-audio AudioParam timeline:
// a starting value, then ramps that each end at an absolute time (seconds
// since the voice started). Used for gain envelopes, pitch sweeps and
// filter cutoff sweeps alike.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curve {
    Linear,
    Exponential,
}

#[derive(Clone, Copy, Debug)]
struct Point {
    at: f32,
    value: f32,
    curve: Curve,
}

#[derive(Clone, Debug)]
pub struct Ramp {
    start: f32,
    points: Vec<Point>,
}

impl Ramp {
    // constant value until a ramp is appended
    pub fn hold(value: f32) -> Self {
        Self { start: value, points: Vec::new() }
    }

    pub fn linear_to(mut self, value: f32, at: f32) -> Self {
        self.points.push(Point { at, value, curve: Curve::Linear });
        self
    }

    pub fn exp_to(mut self, value: f32, at: f32) -> Self {
        self.points.push(Point { at, value, curve: Curve::Exponential });
        self
    }

    pub fn is_constant(&self) -> bool {
        self.points.is_empty()
    }

    // time of the last breakpoint, 0 for a constant
    #[cfg(test)]
    pub fn end(&self) -> f32 {
        self.points.last().map_or(0.0, |p| p.at)
    }

    pub fn value_at(&self, t: f32) -> f32 {
        let (mut t0, mut v0) = (0.0f32, self.start);
        for p in &self.points {
            if t < p.at {
                let span = p.at - t0;
                if span <= 0.0 {
                    return p.value;
                }
                let frac = ((t - t0) / span).clamp(0.0, 1.0);
                return interpolate(v0, p.value, frac, p.curve);
            }
            t0 = p.at;
            v0 = p.value;
        }
        v0
    }
}

fn interpolate(from: f32, to: f32, frac: f32, curve: Curve) -> f32 {
    match curve {
        // exponential ramps need both ends on the same side of zero
        Curve::Exponential if from > 0.0 && to > 0.0 => from * (to / from).powf(frac),
        _ => from + (to - from) * frac,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn hold_is_constant() {
        let r = Ramp::hold(0.3);
        assert!(r.is_constant());
        assert_eq!(r.value_at(0.0), 0.3);
        assert_eq!(r.value_at(10.0), 0.3);
    }

    #[test]
    fn exponential_decay_hits_endpoints_and_midpoint() {
        let r = Ramp::hold(1.0).exp_to(0.01, 0.5);
        assert!(close(r.value_at(0.0), 1.0));
        // geometric mean halfway through
        assert!(close(r.value_at(0.25), 0.1));
        assert!(close(r.value_at(0.5), 0.01));
        assert!(close(r.value_at(3.0), 0.01));
    }

    #[test]
    fn exponential_never_reaches_zero() {
        let r = Ramp::hold(0.8).exp_to(0.01, 1.5);
        for i in 0..=150 {
            assert!(r.value_at(i as f32 * 0.01) > 0.0);
        }
    }

    #[test]
    fn attack_then_decay() {
        // the synth voice envelope
        let r = Ramp::hold(0.0).linear_to(0.3, 0.02).exp_to(0.01, 0.5);
        assert!(close(r.value_at(0.0), 0.0));
        assert!(close(r.value_at(0.01), 0.15));
        assert!(close(r.value_at(0.02), 0.3));
        assert!(r.value_at(0.3) < 0.3);
        assert!(close(r.value_at(0.5), 0.01));
        assert!(close(r.end(), 0.5));
    }

    #[test]
    fn exponential_from_zero_degrades_to_linear() {
        let r = Ramp::hold(0.0).exp_to(0.4, 1.0);
        assert!(close(r.value_at(0.5), 0.2));
    }

    #[test]
    fn down_then_up_sweep() {
        // scratch pitch: base -> half -> 1.5x
        let r = Ramp::hold(200.0).exp_to(100.0, 0.15).exp_to(300.0, 0.3);
        assert!(close(r.value_at(0.15), 100.0));
        assert!(r.value_at(0.2) > 100.0);
        assert!(close(r.value_at(0.3), 300.0));
    }
}
