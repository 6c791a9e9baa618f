//! sea-orm entities backing the roster's local storage.

pub mod kv_entries;
