use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crate::pipeline::outline::STYLES;
use crate::shared::InputEvent;
use super::keymap::KeyMap;

// poll for a key press and resolve it to input events for the middle layer.
// key repeat and releases are ignored, one press = one hit
pub fn poll_input(timeout: Duration, keys: &KeyMap) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, keys));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode, keys: &KeyMap) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],

        // transport
        KeyCode::Tab => vec![InputEvent::ToggleRecord],
        KeyCode::Enter => vec![InputEvent::PlayRecording],
        KeyCode::Char(' ') => vec![InputEvent::Stop],
        KeyCode::Backspace => vec![InputEvent::Clear],

        KeyCode::Up => vec![InputEvent::VolumeUp],
        KeyCode::Down => vec![InputEvent::VolumeDown],

        // F1..F5 generate a song in each style
        KeyCode::F(n @ 1..=5) => vec![InputEvent::Generate(STYLES[n as usize - 1])],
        KeyCode::F(7) => vec![InputEvent::PlaySong],
        KeyCode::F(8) => vec![InputEvent::SaveSong],

        // any sound key
        KeyCode::Char(c) => keys.sound_for(c).map(InputEvent::Trigger).into_iter().collect(),

        _ => vec![],
    }
}
