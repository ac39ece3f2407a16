// A single redrawn status line under a static help block; no full-screen UI.

use std::io::Write;

use crossterm::cursor::MoveToColumn;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;

use crate::shared::StatusLine;
use super::keymap::KeyMap;

// raw mode: lines need an explicit \r
pub fn help_text(keys: &KeyMap) -> String {
    let mut out = String::from("dubboard\r\n");
    for row in keys.bindings().chunks(10) {
        let cells: Vec<String> = row.iter().map(|(k, id)| format!("{k}:{id:<8}")).collect();
        out.push_str(&format!("  {}\r\n", cells.join(" ")));
    }
    out.push_str("  Tab rec  Enter play take  Space stop  Bksp clear  Up/Down volume\r\n");
    out.push_str("  F1-F5 generate (dubstep rap trap house afrobeat)  F7 play song  F8 keep song  Esc quit\r\n");
    out
}

pub fn draw(out: &mut impl Write, line: &StatusLine) -> std::io::Result<()> {
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line))?;
    out.flush()
}
