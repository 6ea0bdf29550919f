use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What happened to the world, in step order. Body names, not handles, so a
/// ledger stays readable across `set_world` resets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    ForceApplied { step: u64, body: String, force: [f32; 3] },
    Restored { body: String, pos: [f32; 3], lin: [f32; 3] },
    Perturbed { body: String, delta: [f32; 3] },
    FrameRecorded { frame: usize, step: u64 },
    FirstContact { frame: usize, a: String, b: String, points: u32 },
}

/// Bounded ring; the oldest events fall off once `cap` is reached.
#[derive(Clone, Debug)]
pub struct Ledger {
    cap: usize,
    events: VecDeque<LedgerEvent>,
    dropped: u64,
}

impl Ledger {
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1), events: VecDeque::with_capacity(cap.max(1)), dropped: 0 }
    }

    pub fn push(&mut self, e: LedgerEvent) {
        if self.events.len() == self.cap {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(e);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEvent> { self.events.iter() }
    #[inline] pub fn len(&self) -> usize { self.events.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.events.is_empty() }
    #[inline] pub fn dropped(&self) -> u64 { self.dropped }

    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }

    /// One JSON object per line.
    pub fn write_jsonl_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        for e in &self.events {
            serde_json::to_writer(&mut w, e)?;
            w.write_all(b"\n")?;
        }
        Ok(())
    }

    /// `dir/ledger_<step>.jsonl`, creating `dir` if needed.
    pub fn write_jsonl(&self, dir: impl AsRef<Path>, step: u64) -> io::Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("ledger_{step:08}.jsonl"));
        let f = io::BufWriter::new(std::fs::File::create(&path)?);
        self.write_jsonl_to(f)?;
        log::debug!("ledger: {} events -> {}", self.events.len(), path.display());
        Ok(path)
    }
}
