//! Tool catalogue: schemas, validation and the executor seam.
//!
//! A tool is declared once as a [`ToolSpec`] and bound to the collaborator
//! that carries it out. Nothing here performs I/O; the collaborators do.

mod catalog;
pub mod executor;
pub(crate) mod registry;
pub mod validation;

pub use catalog::builtin_registry;
pub use executor::{JsonObject, ToolExecutor, UpstreamError, UpstreamErrorKind, arg_f64, arg_i64, arg_str};
pub use registry::{DATE_FORMAT, ParamSpec, ParamType, ToolRegistry, ToolSpec, parse_number};
pub use validation::ValidationError;
