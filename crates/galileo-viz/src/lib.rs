//! Human-facing step diagnostics (`DebugSettings`) and a bounded provenance
//! ring (`Ledger`) that worlds append to while stepping.

mod debug;
mod ledger;

pub use debug::DebugSettings;
pub use ledger::{Ledger, LedgerEvent};
