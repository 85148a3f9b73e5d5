pub mod progress;
pub mod questions;
pub mod sessions;
