//! Banner Types - Pure type definitions shared by the banner crates
//!
//! This crate contains only plain data types with no runtime or storage
//! dependencies.

pub mod banner;
pub mod filter;

pub use banner::*;
pub use filter::*;
