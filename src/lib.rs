//! # Astronomical Event Engine
//!
//! A long-horizon precomputation and query engine for calendar-relevant
//! astronomical events — planetary aspects, lunar phases, inner-planet
//! phases, eclipses, and solar turning points — across the 1900-2100
//! range, persisted to a single SQLite file.
//!
//! ## Design Philosophy
//!
//! ### Pure Computation, Swappable Ephemeris
//! Every detector depends only on the [`ephemeris::Ephemeris`] trait, never
//! on a specific backend. The crate ships one implementation
//! ([`ephemeris::LowPrecisionEphemeris`], closed-form, no external data
//! file) so the whole pipeline is exercised without a native dependency;
//! a production embedder can swap in a Swiss-Ephemeris- or JPL-DE-backed
//! adapter without touching a single detector.
//!
//! ### Coarse Scan, Fine Refine
//! Every detector follows the same shape: step forward at a fixed cadence
//! to bracket a candidate (a sign change, a local extremum, an
//! ephemeris-reported syzygy), then hand that bracket to
//! [`root_finder::bisect`] or [`root_finder::golden_section_max`] for a
//! bounded number of refinement iterations. No detector searches
//! unboundedly; every loop has a fixed budget.
//!
//! ### One Serialization Point
//! The store connection is the crate's only shared mutable resource.
//! [`coordinator::Coordinator`] is the sole component that yields — between
//! years and between detectors — for progress reporting and cooperative
//! cancellation; detectors themselves run a year to completion
//! synchronously.
//!
//! ## Core Types
//!
//! - [`coordinator::Coordinator`]: drives detectors across a year range and
//!   writes results.
//! - [`query::QueryApi`]: read-only filtered access to stored events.
//! - [`store::Store`]: schema bootstrap and idempotent batch writes.
//! - [`config::EngineConfig`]: orb policy, scan cadence, and store tuning.
//!
//! # Example
//!
//! ```no_run
//! use astro_events_core::config::EngineConfig;
//! use astro_events_core::coordinator::{CancellationToken, Coordinator};
//! use astro_events_core::ephemeris::LowPrecisionEphemeris;
//! use astro_events_core::query::{AspectFilter, QueryApi};
//! use astro_events_core::store::Store;
//! use chrono::{TimeZone, Utc};
//!
//! let mut store = Store::open("astro-events.sqlite3").unwrap();
//! let ephem = LowPrecisionEphemeris::new();
//! let config = EngineConfig::default();
//!
//! let mut coordinator = Coordinator::new(&mut store, &ephem, &config);
//! let cancel = CancellationToken::new();
//! let outcome = coordinator
//!     .run(2000, 2000, &cancel, |pct, msg| println!("{pct:.0}% {msg}"))
//!     .unwrap();
//! println!("stored {} events", outcome.events_count);
//!
//! let query = QueryApi::new(&store);
//! let start = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
//! let aspects = query.get_aspects(start, end, &AspectFilter::default()).unwrap();
//! ```

pub mod angle;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod detectors;
pub mod ephemeris;
pub mod error;
pub mod query;
pub mod root_finder;
pub mod store;

pub use coordinator::{CancellationToken, Coordinator, RunOutcome};
pub use error::{CoreError, CoreResult};
pub use query::QueryApi;
pub use store::Store;
