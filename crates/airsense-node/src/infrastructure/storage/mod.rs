//! Flash filesystem adapters.
//!
//! - **`directory`** – Maps the flash filesystem onto a host directory.  Used
//!   by the `airsense-node` binary.
//! - **`memory`** – Keeps files in memory, with switches to simulate mount,
//!   open, and write failures.  Used by tests.

pub mod directory;
pub mod memory;

pub use directory::DirectoryFlash;
pub use memory::MemoryFlash;
