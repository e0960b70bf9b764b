//! # Handler Resolver
//!
//! Maps each [`ParsedRoute`](crate::spec::ParsedRoute) to a concrete
//! [`Handler`](crate::handler::Handler) using one or more resolution modes,
//! tried in order:
//!
//! - **unique**: a single controller supplies all operations;
//! - **per-route**: controller module derived from the first URL segment;
//! - **per-operation**: controller module named by the operation's
//!   `x-controller` extension;
//! - **manual**: an explicit URL-pattern mapping with a `default` fallback.
//!
//! When no explicit chain is configured the mode is auto-detected from which
//! options are present. A route no mode claims still gets a handler: the
//! not-implemented fallback, which answers 501 when that route is invoked.

mod controller;
mod core;
mod error;

pub use controller::{Controller, ControllerSource, ModuleResolver};
pub use core::{resolve, ResolutionMap, ResolutionMode, ResolverOptions};
pub use error::ResolutionError;
