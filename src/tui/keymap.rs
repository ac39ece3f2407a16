use std::collections::HashMap;

use crate::audio::SoundRegistry;

// one key per sound, number row first, in registry order
pub const SOUND_KEYS: &str = "1234567890qwertyuiopasdfghjklzxcvbnm";

pub struct KeyMap {
    bindings: Vec<(char, &'static str)>,
    by_key: HashMap<char, &'static str>,
}

impl KeyMap {
    pub fn new(registry: &SoundRegistry) -> Self {
        let bindings: Vec<(char, &'static str)> = SOUND_KEYS.chars().zip(registry.ids()).collect();
        if registry.len() > bindings.len() {
            tracing::warn!(unbound = registry.len() - bindings.len(), "more sounds than keys");
        }
        let by_key = bindings.iter().copied().collect();
        Self { bindings, by_key }
    }

    // shifted letters play the same sound
    pub fn sound_for(&self, c: char) -> Option<&'static str> {
        self.by_key.get(&c.to_ascii_lowercase()).copied()
    }

    pub fn key_for(&self, sound_id: &str) -> Option<char> {
        self.bindings.iter().find(|(_, id)| *id == sound_id).map(|(k, _)| *k)
    }

    pub fn bindings(&self) -> &[(char, &'static str)] {
        &self.bindings
    }
}
