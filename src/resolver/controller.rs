//! Controller values and their materialization into handler maps.
//!
//! A controller configuration value is not always a ready-made map: it may be
//! a factory, a constructor, or the name of a module that a caller-supplied
//! loader turns into one of those. [`ControllerSource`] is the closed variant
//! over those shapes; materialization recurses until a [`Controller`] comes
//! out or the chain is declared hopeless.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::handler::{Handler, HandlerRequest, HandlerResponse};

use super::core::ResolverOptions;
use super::error::ResolutionError;

/// A factory/module chain longer than this never produces a handler map.
const MAX_MATERIALIZE_DEPTH: usize = 8;

/// Materialized controller: an operationId → handler map.
#[derive(Clone, Default)]
pub struct Controller {
    handlers: HashMap<String, Handler>,
}

impl Controller {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under an operation id.
    pub fn insert(&mut self, operation_id: impl Into<String>, handler: Handler) {
        self.handlers.insert(operation_id.into(), handler);
    }

    /// Builder-style [`insert`](Self::insert) taking a plain closure.
    #[must_use]
    pub fn with_operation(
        mut self,
        operation_id: impl Into<String>,
        f: impl Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    ) -> Self {
        self.insert(operation_id, Handler::new(f));
        self
    }

    /// Look up the handler for an operation id.
    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<Handler> {
        self.handlers.get(operation_id).cloned()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("operations", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// How a controller value is produced.
#[derive(Clone)]
pub enum ControllerSource {
    /// Ready-made handler map
    Static(Controller),
    /// Callable producing another source; may fail
    Factory(Arc<dyn Fn() -> anyhow::Result<ControllerSource> + Send + Sync>),
    /// Constructor-like callable producing a controller directly
    Constructor(Arc<dyn Fn() -> Controller + Send + Sync>),
    /// Module identifier resolved through the caller's [`ModuleResolver`]
    Module(String),
}

impl ControllerSource {
    pub fn factory(
        f: impl Fn() -> anyhow::Result<ControllerSource> + Send + Sync + 'static,
    ) -> Self {
        ControllerSource::Factory(Arc::new(f))
    }

    pub fn constructor(f: impl Fn() -> Controller + Send + Sync + 'static) -> Self {
        ControllerSource::Constructor(Arc::new(f))
    }

    pub fn module(name: impl Into<String>) -> Self {
        ControllerSource::Module(name.into())
    }
}

impl From<Controller> for ControllerSource {
    fn from(controller: Controller) -> Self {
        ControllerSource::Static(controller)
    }
}

impl fmt::Debug for ControllerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerSource::Static(controller) => {
                f.debug_tuple("Static").field(controller).finish()
            }
            ControllerSource::Factory(_) => f.write_str("Factory(..)"),
            ControllerSource::Constructor(_) => f.write_str("Constructor(..)"),
            ControllerSource::Module(name) => f.debug_tuple("Module").field(name).finish(),
        }
    }
}

/// Module-loading collaborator: turns a shaped identifier into a controller
/// source. Injected by the caller; the crate never touches the filesystem or
/// a registry itself.
pub trait ModuleResolver: Send + Sync {
    fn load(&self, identifier: &str) -> anyhow::Result<ControllerSource>;
}

impl<F> ModuleResolver for F
where
    F: Fn(&str) -> anyhow::Result<ControllerSource> + Send + Sync,
{
    fn load(&self, identifier: &str) -> anyhow::Result<ControllerSource> {
        self(identifier)
    }
}

/// Recursively materialize a source until a handler map comes out.
pub(super) fn materialize(
    source: ControllerSource,
    options: &ResolverOptions,
) -> Result<Controller, ResolutionError> {
    materialize_inner(source, options, 0)
}

fn materialize_inner(
    source: ControllerSource,
    options: &ResolverOptions,
    depth: usize,
) -> Result<Controller, ResolutionError> {
    if depth > MAX_MATERIALIZE_DEPTH {
        return Err(ResolutionError::ControllerShape {
            detail: format!(
                "controller chain did not produce a handler map within {MAX_MATERIALIZE_DEPTH} steps"
            ),
        });
    }

    match source {
        ControllerSource::Static(controller) => Ok(controller),
        ControllerSource::Constructor(construct) => Ok(construct()),
        ControllerSource::Factory(produce) => {
            let next = produce().map_err(|cause| ResolutionError::ControllerShape {
                detail: format!("controller factory failed: {cause}"),
            })?;
            materialize_inner(next, options, depth + 1)
        }
        ControllerSource::Module(name) => {
            let identifier = shape_module_identifier(&name, options.controllers_dir.as_deref());
            let resolver = options.module_resolver.as_ref().ok_or_else(|| {
                ResolutionError::ControllerImport {
                    identifier: identifier.clone(),
                    cause: anyhow::anyhow!("no module resolver configured"),
                }
            })?;
            let next =
                resolver
                    .load(&identifier)
                    .map_err(|cause| ResolutionError::ControllerImport {
                        identifier: identifier.clone(),
                        cause,
                    })?;
            materialize_inner(next, options, depth + 1)
        }
    }
}

/// Shape a module name into the identifier handed to the resolver: relative
/// names pass through, bare names are joined under `controllers_dir` when
/// present, otherwise the bare name stands as a global lookup.
fn shape_module_identifier(name: &str, controllers_dir: Option<&str>) -> String {
    if name.starts_with("./") || name.starts_with("../") {
        return name.to_string();
    }
    match controllers_dir {
        Some(dir) => format!("{}/{}", dir.trim_end_matches('/'), name),
        None => name.to_string(),
    }
}
