//! Route verification against the static ground truth.

pub mod engine;

pub use engine::{RouteVerifier, SkipReason, SkippedRoute, VerificationOutcome};
