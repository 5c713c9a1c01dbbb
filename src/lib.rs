//! Cookie consent banner engine.
//!
//! Shows a first-visit banner, records per-category consent decisions in
//! origin-scoped local storage, fires the consumer's accept/reject callbacks,
//! and re-applies stored decisions on every later visit. Rendering is left to
//! the host through the [`View`] trait.

pub mod engine;

pub use engine::*;
