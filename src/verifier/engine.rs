//! Route Verification Engine
//!
//! Reconciles model-proposed routes with the ground truth. Policy per route,
//! in encounter order:
//!
//! 1. `confidence_score < min_confidence` → rejected ("low confidence")
//! 2. path in ground truth → accepted, `verified = true`, score unchanged
//! 3. otherwise, strict → rejected ("route not found in source")
//! 4. otherwise, lenient → accepted, `verified = false`, score halved
//!
//! Strict mode therefore never emits a route the source does not declare.

use tracing::{debug, info, warn};

use crate::analyzer::GroundTruth;
use crate::constants::synthesis::DEFAULT_MIN_CONFIDENCE;
use crate::types::RouteInfo;

/// Why a proposed route was not accepted as verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    LowConfidence,
    NotInSource,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowConfidence => write!(f, "low confidence"),
            Self::NotInSource => write!(f, "route not found in source"),
        }
    }
}

/// A recorded verification rejection (not an error)
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRoute {
    pub path: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationOutcome {
    /// Routes kept, in proposal order
    pub accepted: Vec<RouteInfo>,
    /// Routes dropped, with reasons
    pub skipped: Vec<SkippedRoute>,
    /// Lenient mode only: routes kept although absent from the source
    pub unverified: Vec<SkippedRoute>,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteVerifier {
    strict: bool,
    min_confidence: f64,
}

impl Default for RouteVerifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RouteVerifier {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn verify(&self, proposed: Vec<RouteInfo>, ground_truth: &GroundTruth) -> VerificationOutcome {
        let mut outcome = VerificationOutcome::default();
        let total = proposed.len();

        for mut route in proposed {
            if route.confidence_score < self.min_confidence {
                debug!(
                    path = %route.path,
                    confidence = route.confidence_score,
                    min_confidence = self.min_confidence,
                    "Skipping route: low confidence"
                );
                outcome.skipped.push(SkippedRoute {
                    path: route.path,
                    reason: SkipReason::LowConfidence,
                });
                continue;
            }

            if ground_truth.contains(&route.path) {
                route.verified = true;
                outcome.accepted.push(route);
                continue;
            }

            if self.strict {
                warn!(path = %route.path, "Skipping route: not found in source");
                outcome.skipped.push(SkippedRoute {
                    path: route.path,
                    reason: SkipReason::NotInSource,
                });
            } else {
                warn!(path = %route.path, "Keeping unverified route: not found in source");
                route.verified = false;
                route.confidence_score /= 2.0;
                outcome.unverified.push(SkippedRoute {
                    path: route.path.clone(),
                    reason: SkipReason::NotInSource,
                });
                outcome.accepted.push(route);
            }
        }

        info!(
            proposed = total,
            accepted = outcome.accepted.len(),
            skipped = outcome.skipped.len(),
            unverified = outcome.unverified.len(),
            strict = self.strict,
            "Route verification complete"
        );
        outcome
    }
}
