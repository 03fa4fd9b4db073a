//! A concurrently accessed, self-expiring IP blacklist.
//!
//! [`blacklist::IpBlacklist`] holds the blocked identifiers, a
//! [`blacklist::Reaper`] evicts expired ones in the background and
//! [`gate::Guard`] turns blocked callers away in front of a request handler.

pub mod blacklist;
pub mod gate;
