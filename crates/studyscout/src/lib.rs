//! Library surface for the `studyscout` binary.
//!
//! The binary is a thin CLI wrapper; everything it serves lives here so the
//! HTTP router and the resolution pipeline can be embedded and tested
//! in-process.

pub mod api;
pub mod pipeline;
pub mod retry;

pub use studyscout_core as core;
