// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod analysis;
pub mod calibration;
pub mod config;
pub mod dataset;
pub mod experiment;
pub mod export;
pub mod geometry;
pub mod layout;
pub mod runtime;
pub mod session;
pub mod trial;
pub mod util;
