//! In-memory index of devices and profiles.

mod index;
mod profile_entry;

pub use index::MetadataIndex;
