use std::path::PathBuf;

/// Periodic stdout block printed by the world while stepping.
/// `print_every == 0` disables it; `json_every` dumps the ledger as JSONL
/// into `dump_dir`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugSettings {
    pub print_every: u32,
    pub json_every: u32,
    pub show_bodies: bool,
    pub show_contacts: bool,
    pub show_energy: bool,
    pub max_lines: usize,
    pub dump_dir: PathBuf,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            print_every: 0,
            json_every: 0,
            show_bodies: true,
            show_contacts: true,
            show_energy: true,
            max_lines: 16,
            dump_dir: PathBuf::from("out"),
        }
    }
}

impl DebugSettings {
    #[inline]
    pub fn prints_at(&self, step: u64) -> bool {
        self.print_every != 0 && step % self.print_every as u64 == 0
    }
    #[inline]
    pub fn dumps_at(&self, step: u64) -> bool {
        self.json_every != 0 && step % self.json_every as u64 == 0
    }
}
