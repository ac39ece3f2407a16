use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoiceType {
    Bass,
    Wobble,
    Kick,
    Snare,
    Clap,
    Hihat,
    Perc,
    Crash,
    Synth,
    Lead,
    Pad,
    Vocal,
    Scratch,
    Riser,
    Impact,
    Sweep,
    Reverse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Bass,
    Wobble,
    Drums,
    Synth,
    Fx,
}

impl Category {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bass" => Some(Category::Bass),
            "wobble" => Some(Category::Wobble),
            "drums" => Some(Category::Drums),
            "synth" => Some(Category::Synth),
            "fx" => Some(Category::Fx),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoundDefinition {
    pub id: &'static str,
    pub voice: VoiceType,
    pub base_frequency: Option<f32>, // Hz
    pub modulation_rate: Option<f32>, // Hz, wobble LFO
    pub category: Category,
}

const fn def(id: &'static str, voice: VoiceType, freq: Option<f32>, category: Category) -> SoundDefinition {
    SoundDefinition { id, voice, base_frequency: freq, modulation_rate: None, category }
}

const fn wobble(id: &'static str, freq: f32, rate: f32) -> SoundDefinition {
    SoundDefinition {
        id,
        voice: VoiceType::Wobble,
        base_frequency: Some(freq),
        modulation_rate: Some(rate),
        category: Category::Wobble,
    }
}

use Category as C;
use VoiceType as V;

// the whole keyboard, in display order
const SOUNDS: [SoundDefinition; 36] = [
    def("bass1", V::Bass, Some(55.0), C::Bass),
    def("bass2", V::Bass, Some(41.0), C::Bass),
    def("bass3", V::Bass, Some(65.0), C::Bass),
    wobble("wobble1", 110.0, 4.0),
    wobble("wobble2", 82.0, 6.0),
    wobble("wobble3", 147.0, 8.0),
    def("kick1", V::Kick, Some(60.0), C::Drums),
    def("kick2", V::Kick, Some(50.0), C::Drums),
    def("snare1", V::Snare, None, C::Drums),
    def("snare2", V::Snare, Some(220.0), C::Drums),
    def("clap", V::Clap, None, C::Drums),
    def("hihat1", V::Hihat, None, C::Drums),
    def("hihat2", V::Hihat, Some(10000.0), C::Drums),
    def("perc1", V::Perc, Some(800.0), C::Drums),
    def("perc2", V::Perc, Some(1200.0), C::Drums),
    def("crash", V::Crash, None, C::Drums),
    // C major, C4..B4
    def("synth1", V::Synth, Some(261.63), C::Synth),
    def("synth2", V::Synth, Some(293.66), C::Synth),
    def("synth3", V::Synth, Some(329.63), C::Synth),
    def("synth4", V::Synth, Some(349.23), C::Synth),
    def("synth5", V::Synth, Some(392.00), C::Synth),
    def("synth6", V::Synth, Some(440.00), C::Synth),
    def("synth7", V::Synth, Some(493.88), C::Synth),
    def("lead1", V::Lead, Some(523.25), C::Synth),
    def("lead2", V::Lead, Some(659.25), C::Synth),
    def("pad1", V::Pad, Some(130.81), C::Synth),
    def("pad2", V::Pad, Some(164.81), C::Synth),
    def("pad3", V::Pad, Some(196.00), C::Synth),
    def("vocal1", V::Vocal, Some(300.0), C::Fx),
    def("vocal2", V::Vocal, Some(400.0), C::Fx),
    def("vocal3", V::Vocal, Some(500.0), C::Fx),
    def("scratch", V::Scratch, None, C::Fx),
    def("fx1", V::Riser, None, C::Fx),
    def("fx2", V::Impact, None, C::Fx),
    def("fx3", V::Sweep, None, C::Fx),
    def("fx4", V::Reverse, None, C::Fx),
];

// Immutable id -> definition catalog, built once at startup
pub struct SoundRegistry {
    order: Vec<&'static str>,
    by_id: HashMap<&'static str, SoundDefinition>,
}

impl SoundRegistry {
    pub fn builtin() -> Self {
        Self::from_definitions(&SOUNDS)
    }

    // later duplicates are ignored so ids stay unique
    pub fn from_definitions(defs: &[SoundDefinition]) -> Self {
        let mut order = Vec::with_capacity(defs.len());
        let mut by_id = HashMap::with_capacity(defs.len());
        for d in defs {
            if by_id.contains_key(d.id) {
                continue;
            }
            order.push(d.id);
            by_id.insert(d.id, *d);
        }
        Self { order, by_id }
    }

    pub fn lookup(&self, sound_id: &str) -> Option<&SoundDefinition> {
        self.by_id.get(sound_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &SoundDefinition> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .filter(move |d| d.category == category)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

impl Default for SoundRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
