//! Size-triggered, generational rotation of the live log file.
//!
//! Generation 0 is the file being written (`<base>.log`); generation `k > 0`
//! is a retired copy (`<base>-k.log`). When the live file reaches the byte
//! budget, every retained generation moves one step older, the oldest is
//! dropped, and a fresh generation 0 is opened in place.

pub mod rotation_controller;
pub mod rotation_policy;

#[cfg(test)]
mod tests;

pub use rotation_controller::{RotationController, RotationState};
pub use rotation_policy::{DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_GENERATIONS, OpenMode, RotationPolicy};
