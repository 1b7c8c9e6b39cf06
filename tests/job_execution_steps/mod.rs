//! Step definitions for job execution behaviour tests.

mod given;
mod then;
mod when;
pub mod world;
