//! Line-based keyboard controls for `galileo interactive`.

use std::io::BufRead;
use std::sync::mpsc::{channel, Receiver};
use std::thread;

use galileo_world::Control;

fn parse_key(line: &str) -> Option<Control> {
    match line.trim() {
        "p" | "P" => Some(Control::TogglePause),
        "r" | "R" => Some(Control::Reset),
        "q" | "Q" => Some(Control::Quit),
        _ => None,
    }
}

/// Reads stdin on a helper thread. Closing stdin ends the session.
pub fn spawn_stdin_controls() -> Receiver<Control> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let Some(c) = parse_key(&line) else {
                log::warn!("unknown key {:?} (p = pause, r = reset, q = quit)", line.trim());
                continue;
            };
            if tx.send(c).is_err() || c == Control::Quit { break; }
        }
    });
    rx
}
