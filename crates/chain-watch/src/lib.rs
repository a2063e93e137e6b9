//! # Chain Watch
//!
//! The polling state machine that walks the canonical chain forward one
//! block at a time. Each iteration runs four ordered phases:
//!
//! 1. mempool scan — pending transfers are classified and emitted first,
//! 2. height probe — no new block means sleep and retry,
//! 3. catch-up — every block in `(last_seen, current]` is fetched in
//!    ascending order and its transfers cross-checked against the address
//!    book,
//! 4. commit — the last-seen state is persisted once per fully processed
//!    block, so a crash mid-catch-up never replays completed blocks.
//!
//! Transient upstream errors abort the iteration; the poll interval is the
//! back-off. The watcher is the sole owner of the last-seen state.

pub mod config;
pub mod errors;
pub mod state;
pub mod watcher;

pub use config::WatchConfig;
pub use errors::WatchError;
pub use state::LastSeenState;
pub use watcher::Watcher;
