mod clock;
mod entry;
mod error;
mod global;
mod list;
mod reaper;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, SystemClock};
pub use entry::Entry;
pub use error::BlacklistError;
pub use global::{add, contains, global, remove, snapshot};
pub use list::IpBlacklist;
pub use reaper::{Reaper, DEFAULT_REAP_INTERVAL};
