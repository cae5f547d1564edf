// patchbay-persist: storage backends for the patchbay inventory engine.
//
// Implementations of `patchbay_core::Persistence`. The engine never knows
// which backend it is talking to; both collections are loaded and saved as
// independent documents so one malformed part cannot poison the other.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
