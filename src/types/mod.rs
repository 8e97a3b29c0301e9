pub mod error;
pub mod route;

pub use error::{ErrorCategory, ErrorClassifier, LlmError, Result, RouteSageError};
pub use route::{
    ApiDocumentation, ParameterKind, RouteInfo, RouteParameter, clamp_confidence,
    normalize_methods,
};
