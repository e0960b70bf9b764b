//! Resolution modes and the mode chain.
//!
//! Resolution is a pure (mode, route, options) → handler computation run once
//! per route at startup. Modes are tried in order; the first one that yields
//! a handler wins, and a route no mode claims gets a fallback handler that
//! answers 501 at request time.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::handler::{Handler, HandlerResponse};
use crate::spec::ParsedRoute;

use super::controller::{materialize, ControllerSource, ModuleResolver};
use super::error::ResolutionError;

const CONTROLLER_EXT: &str = "x-controller";

/// One strategy for mapping an operation to a concrete handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// A single controller supplies every operation (`controller` option)
    Unique,
    /// Controller module named after the route's first URL segment
    /// (`controllers_dir` option)
    PerRoute,
    /// Controller module named by the operation's `x-controller` extension
    /// (`controllers_dir` option)
    PerOperation,
    /// Explicit URL-pattern mapping (`resolution_config` option)
    Manual,
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionMode::Unique => "unique",
            ResolutionMode::PerRoute => "per-route",
            ResolutionMode::PerOperation => "per-operation",
            ResolutionMode::Manual => "manual",
        };
        f.write_str(name)
    }
}

/// Ordered manual-resolution mapping from URL keys to controller sources.
///
/// The reserved `default` key never participates in pattern matching; it is
/// the final fallback. Entry order matters for prefix and regex matching.
#[derive(Debug, Clone, Default)]
pub struct ResolutionMap {
    entries: Vec<(String, ControllerSource)>,
    default: Option<ControllerSource>,
}

impl ResolutionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. The key `default` sets the fallback instead.
    pub fn insert(&mut self, key: impl Into<String>, source: impl Into<ControllerSource>) {
        let key = key.into();
        if key == "default" {
            self.default = Some(source.into());
        } else {
            self.entries.push((key, source.into()));
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, source: impl Into<ControllerSource>) -> Self {
        self.insert(key, source);
        self
    }

    /// Pick the source for a route URL.
    ///
    /// Exact key equality is checked across all entries first; then each
    /// entry in insertion order is tried as a prefix and, failing that, as a
    /// regular expression; finally the `default` source. The first matching
    /// entry decides even when its controller turns out to lack the
    /// operation.
    fn lookup(&self, url: &str) -> Result<Option<&ControllerSource>, ResolutionError> {
        for (key, source) in &self.entries {
            if key == url {
                return Ok(Some(source));
            }
        }
        for (key, source) in &self.entries {
            if url.starts_with(key.as_str()) {
                return Ok(Some(source));
            }
            let pattern = Regex::new(key).map_err(|err| ResolutionError::InvalidPattern {
                key: key.clone(),
                source: err,
            })?;
            if pattern.is_match(url) {
                return Ok(Some(source));
            }
        }
        Ok(self.default.as_ref())
    }
}

/// Handler-resolution configuration.
///
/// Field names mirror the configuration surface: `controller`,
/// `controllersDir`, `resolution`, `resolutionConfig`, plus the
/// module-loading collaborator.
#[derive(Default)]
pub struct ResolverOptions {
    /// Controller for the `unique` mode
    pub controller: Option<ControllerSource>,
    /// Base directory bare module names are loaded relative to
    pub controllers_dir: Option<String>,
    /// Explicit mode chain; `None` triggers auto-detection
    pub resolution: Option<Vec<ResolutionMode>>,
    /// Mapping for the `manual` mode
    pub resolution_config: Option<ResolutionMap>,
    /// Caller-supplied module loader for string controller names
    pub module_resolver: Option<Arc<dyn ModuleResolver>>,
}

impl ResolverOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_controller(mut self, source: impl Into<ControllerSource>) -> Self {
        self.controller = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_controllers_dir(mut self, dir: impl Into<String>) -> Self {
        self.controllers_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_resolution(mut self, modes: impl IntoIterator<Item = ResolutionMode>) -> Self {
        self.resolution = Some(modes.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_resolution_config(mut self, map: ResolutionMap) -> Self {
        self.resolution_config = Some(map);
        self
    }

    #[must_use]
    pub fn with_module_resolver(mut self, resolver: impl ModuleResolver + 'static) -> Self {
        self.module_resolver = Some(Arc::new(resolver));
        self
    }

    /// The mode chain to try, auto-detected when not set explicitly:
    /// `controller` implies `unique`, else `resolution_config` implies
    /// `manual`, else `controllers_dir` implies `per-route`.
    pub fn modes(&self) -> Result<Vec<ResolutionMode>, ResolutionError> {
        if let Some(modes) = &self.resolution {
            return Ok(modes.clone());
        }
        if self.controller.is_some() {
            return Ok(vec![ResolutionMode::Unique]);
        }
        if self.resolution_config.is_some() {
            return Ok(vec![ResolutionMode::Manual]);
        }
        if self.controllers_dir.is_some() {
            return Ok(vec![ResolutionMode::PerRoute]);
        }
        Err(ResolutionError::NoModeDetermined)
    }

    /// Check the prerequisites of every selected mode, so a misconfiguration
    /// fails before the first route resolves.
    pub fn validate(&self) -> Result<(), ResolutionError> {
        for mode in self.modes()? {
            self.require(mode)?;
        }
        Ok(())
    }

    fn require(&self, mode: ResolutionMode) -> Result<(), ResolutionError> {
        let missing = match mode {
            ResolutionMode::Unique if self.controller.is_none() => Some("controller"),
            ResolutionMode::Manual if self.resolution_config.is_none() => Some("resolutionConfig"),
            ResolutionMode::PerRoute | ResolutionMode::PerOperation
                if self.controllers_dir.is_none() =>
            {
                Some("controllersDir")
            }
            _ => None,
        };
        match missing {
            Some(option) => Err(ResolutionError::MissingOption { mode, option }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ResolverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverOptions")
            .field("controller", &self.controller)
            .field("controllers_dir", &self.controllers_dir)
            .field("resolution", &self.resolution)
            .field("resolution_config", &self.resolution_config)
            .field("module_resolver", &self.module_resolver.is_some())
            .finish()
    }
}

/// Resolve the handler for one route.
///
/// Always returns a callable: when every mode yields nothing the route gets
/// the not-implemented fallback, which fails at invocation time (status 501),
/// never at resolution time. When the route carries a wildcard, whatever
/// handler came out is wrapped so the positional `*` capture is also visible
/// under the original parameter name.
pub fn resolve(route: &ParsedRoute, options: &ResolverOptions) -> Result<Handler, ResolutionError> {
    let handler = resolve_modes(route, options)?
        .unwrap_or_else(|| not_implemented_handler(&route.operation_id));
    Ok(adapt_wildcard(handler, route.wildcard.as_deref()))
}

fn resolve_modes(
    route: &ParsedRoute,
    options: &ResolverOptions,
) -> Result<Option<Handler>, ResolutionError> {
    for mode in options.modes()? {
        if let Some(handler) = resolve_mode(mode, route, options)? {
            debug!(%mode, operation_id = %route.operation_id, url = %route.url, "resolved handler");
            return Ok(Some(handler));
        }
    }
    Ok(None)
}

fn resolve_mode(
    mode: ResolutionMode,
    route: &ParsedRoute,
    options: &ResolverOptions,
) -> Result<Option<Handler>, ResolutionError> {
    options.require(mode)?;

    match mode {
        ResolutionMode::Unique => match options.controller.clone() {
            Some(source) => {
                let controller = materialize(source, options)?;
                Ok(controller.get(&route.operation_id))
            }
            None => Err(ResolutionError::MissingOption {
                mode,
                option: "controller",
            }),
        },
        ResolutionMode::Manual => {
            let Some(config) = options.resolution_config.as_ref() else {
                return Err(ResolutionError::MissingOption {
                    mode,
                    option: "resolutionConfig",
                });
            };
            match config.lookup(&route.url)? {
                Some(source) => {
                    let controller = materialize(source.clone(), options)?;
                    Ok(controller.get(&route.operation_id))
                }
                None => Ok(None),
            }
        }
        ResolutionMode::PerOperation => {
            match route
                .openapi_source
                .get(CONTROLLER_EXT)
                .and_then(Value::as_str)
            {
                Some(module) => {
                    let controller = materialize(ControllerSource::module(module), options)?;
                    Ok(controller.get(&route.operation_id))
                }
                // No extension on the operation: this mode yields nothing
                // and the chain continues.
                None => Ok(None),
            }
        }
        ResolutionMode::PerRoute => {
            let scope = route_scope(&route.url);
            let source = ControllerSource::module(format!("{scope}.controller"));
            let controller = materialize(source, options)?;
            Ok(controller.get(&route.operation_id))
        }
    }
}

/// Scope of a route for per-route resolution: the first URL segment, or
/// `root` when that segment is empty, a `:param` placeholder, or a wildcard.
fn route_scope(url: &str) -> &str {
    let first = url.trim_start_matches('/').split('/').next().unwrap_or("");
    if first.is_empty() || first.starts_with(':') || first == "*" {
        "root"
    } else {
        first
    }
}

/// Fallback for routes no mode claimed: defers the failure to request time.
fn not_implemented_handler(operation_id: &str) -> Handler {
    let operation_id = operation_id.to_string();
    Handler::new(move |_req| {
        HandlerResponse::error(501, &format!("Operation {operation_id} not implemented"))
    })
}

/// Copy the positional `*` capture into the original parameter name before
/// delegating, preserving the caller-visible contract despite the URL
/// rewrite.
fn adapt_wildcard(handler: Handler, wildcard: Option<&str>) -> Handler {
    let Some(name) = wildcard else {
        return handler;
    };
    let name: Arc<str> = Arc::from(name);
    Handler::new(move |mut req| {
        if let Some(value) = req.get_path_param("*").map(str::to_string) {
            req.path_params.push((Arc::clone(&name), value));
        }
        handler.call(req)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_scope_falls_back_to_root() {
        assert_eq!(route_scope("/"), "root");
        assert_eq!(route_scope("/:id"), "root");
        assert_eq!(route_scope("/*"), "root");
        assert_eq!(route_scope("/pet/:id"), "pet");
    }

    #[test]
    fn test_auto_detection_order() {
        let unique = ResolverOptions::new().with_controller(super::super::Controller::new());
        assert_eq!(unique.modes().unwrap(), vec![ResolutionMode::Unique]);

        let manual = ResolverOptions::new().with_resolution_config(ResolutionMap::new());
        assert_eq!(manual.modes().unwrap(), vec![ResolutionMode::Manual]);

        let per_route = ResolverOptions::new().with_controllers_dir("controllers");
        assert_eq!(per_route.modes().unwrap(), vec![ResolutionMode::PerRoute]);

        assert!(matches!(
            ResolverOptions::new().modes(),
            Err(ResolutionError::NoModeDetermined)
        ));
    }
}
