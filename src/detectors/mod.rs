//! Event Detectors (C4): coarse scan → bracket → refine → canonical record
//! → dedup, one module per event kind, run in the fixed order the
//! coordinator relies on for deterministic progress reporting: aspects →
//! lunar phases → planet phases → eclipses → solar events.

pub mod aspect;
pub mod eclipse;
pub mod lunar_phase;
pub mod planet_phase;
pub mod solar_event;
