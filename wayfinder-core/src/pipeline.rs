//! Per-action processing: collect middleware, bind the action, derive its
//! path and register the route.

use std::sync::Arc;

use tracing::{debug, info};

use crate::action::Action;
use crate::collector::{run_collectors, CollectContext, MiddlewareCollector};
use crate::controller::{ControllerClass, ControllerInstance, ControllerOptions};
use crate::error::LoadError;
use crate::handler::Handler;
use crate::options::LoaderOptions;
use crate::path;
use crate::router::RouteTarget;
use crate::walker::FileInfo;

/// A discovered controller, ready to have its actions registered.
pub struct ControllerInstanceInfo {
    pub file: FileInfo,
    pub class: ControllerClass,
    pub class_name: String,
    pub options: ControllerOptions,
    pub instance: ControllerInstance,
    /// Actions to register, in order, after `filter_actions`.
    pub actions: Vec<Action>,
}

pub struct EnsurePathOptions<'a> {
    pub action: &'a Action,
    pub file: &'a FileInfo,
    pub class_name: &'a str,
    pub options: &'a ControllerOptions,
}

pub struct RegisterRouteOptions<'a> {
    pub action: &'a Action,
    pub path: &'a str,
    /// Full chain: collected middleware followed by the bound action.
    pub middleware: Vec<Handler>,
    pub controller_name: &'a str,
    pub options: &'a ControllerOptions,
}

/// A route registered by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    /// Upper-case verb.
    pub method: String,
    pub path: String,
    pub controller: String,
}

/// The steps available to a `process_action` hook, each dispatching to the
/// configured hook.
pub struct Pipeline<'a> {
    options: &'a LoaderOptions,
    collectors: &'a [Arc<dyn MiddlewareCollector>],
    router: &'a mut dyn RouteTarget,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        options: &'a LoaderOptions,
        collectors: &'a [Arc<dyn MiddlewareCollector>],
        router: &'a mut dyn RouteTarget,
    ) -> Self {
        Self {
            options,
            collectors,
            router,
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        self.options
    }

    pub fn router(&mut self) -> &mut dyn RouteTarget {
        &mut *self.router
    }

    /// Run the collectors for `action`. `false` means the action was vetoed.
    pub fn collect_middleware(
        &self,
        info: &ControllerInstanceInfo,
        action: &Action,
        middleware: &mut Vec<Handler>,
    ) -> bool {
        let ctx = CollectContext {
            instance: &info.instance,
            class_name: &info.class_name,
            options: &info.options,
            action,
        };
        run_collectors(self.collectors, &ctx, middleware)
    }

    pub fn normalize_middleware(&self, middleware: Vec<Handler>) -> Vec<Handler> {
        (self.options.normalize_middleware)(middleware)
    }

    pub fn ensure_path(&self, action: &Action, info: &ControllerInstanceInfo) -> String {
        (self.options.ensure_path)(&EnsurePathOptions {
            action,
            file: &info.file,
            class_name: &info.class_name,
            options: &info.options,
        })
    }

    pub fn register_route(&mut self, opts: RegisterRouteOptions<'_>) -> Result<(), LoadError> {
        (self.options.register_route)(&mut *self.router, opts)
    }
}

/// Default `process_action`: collect, normalize, bind, derive the path,
/// register.
///
/// Returns `Ok(None)` when a collector vetoed the action.
pub fn process_action(
    pipeline: &mut Pipeline<'_>,
    action: &Action,
    info: &ControllerInstanceInfo,
) -> Result<Option<RouteRecord>, LoadError> {
    let mut collected = Vec::new();
    if !pipeline.collect_middleware(info, action, &mut collected) {
        debug!(
            controller = %info.class_name,
            action = action.name(),
            "Action vetoed by middleware collector"
        );
        return Ok(None);
    }

    let mut middleware = pipeline.normalize_middleware(collected);
    let handler = action
        .bind(&info.instance)
        .ok_or_else(|| LoadError::HandlerMismatch {
            controller: info.class_name.clone(),
            action: action.name().to_string(),
        })?;
    middleware.push(handler);

    let path = pipeline.ensure_path(action, info);
    pipeline.register_route(RegisterRouteOptions {
        action,
        path: &path,
        middleware,
        controller_name: &info.class_name,
        options: &info.options,
    })?;

    Ok(Some(RouteRecord {
        method: action.method().to_string(),
        path,
        controller: info.class_name.clone(),
    }))
}

/// Default `ensure_path`.
///
/// An explicit path is joined onto the controller prefix, or used verbatim
/// without one. Otherwise the path comes from the file location and the
/// action name, and the prefix is not applied.
pub fn ensure_path(opts: &EnsurePathOptions<'_>) -> String {
    if let Some(explicit) = opts.action.path() {
        return match opts.options.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => path::join(&[prefix, explicit]),
            _ => explicit.to_string(),
        };
    }
    path::join(&[
        "/",
        &opts.file.dirname,
        &opts.file.basename,
        opts.action.name(),
    ])
}

/// Default `register_route`: hand the chain to the router under the
/// lower-case verb and log the registration.
pub fn register_route(
    router: &mut dyn RouteTarget,
    opts: RegisterRouteOptions<'_>,
) -> Result<(), LoadError> {
    let method = opts.action.method();
    let path = opts.path;
    router.route(&method.to_lowercase(), path, opts.middleware)?;
    info!(method, path, "Register Route \"{method} {path}\"");
    Ok(())
}
