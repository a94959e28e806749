//! Route targets: where finished handler chains are registered.

use std::collections::{HashMap, HashSet};
use std::mem;

use tracing::debug;

use crate::error::LoadError;
use crate::handler::{Handler, HandlerChain};
use crate::http::{MethodFilter, Request, Router};

/// The router the loader registers routes with.
///
/// One call per route: the lower-case verb, the final path and the full
/// ordered chain (middleware first, bound action last). Implementations
/// decide which verbs they accept; the loader never checks in advance.
pub trait RouteTarget {
    fn route(&mut self, verb: &str, path: &str, handlers: Vec<Handler>) -> Result<(), LoadError>;
}

impl<T: RouteTarget + ?Sized> RouteTarget for &mut T {
    fn route(&mut self, verb: &str, path: &str, handlers: Vec<Handler>) -> Result<(), LoadError> {
        (**self).route(verb, path, handlers)
    }
}

/// [`RouteTarget`] building an [`axum::Router`].
///
/// Conditions that would make axum panic are reported as [`LoadError`]s
/// instead: a path without a leading `/`, a malformed `{capture}`, the same
/// verb and path registered twice, or two paths naming the same capture
/// position differently (`/users/{id}` and `/users/{name}`).
#[derive(Default)]
pub struct AxumRouter {
    router: Router,
    registered: HashSet<(String, String)>,
    /// Path prefix (captures shown as `{}`) -> capture token and the path
    /// that introduced it.
    captures: HashMap<String, (String, String)>,
}

impl AxumRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from an existing router. Routes it already holds are not
    /// known to the duplicate check.
    pub fn from_router(router: Router) -> Self {
        Self {
            router,
            registered: HashSet::new(),
            captures: HashMap::new(),
        }
    }

    /// Number of routes registered through this target.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

fn method_filter(verb: &str) -> Option<MethodFilter> {
    Some(match verb {
        "get" => MethodFilter::GET,
        "post" => MethodFilter::POST,
        "put" => MethodFilter::PUT,
        "delete" => MethodFilter::DELETE,
        "head" => MethodFilter::HEAD,
        "patch" => MethodFilter::PATCH,
        "options" => MethodFilter::OPTIONS,
        _ => return None,
    })
}

/// A `{name}` or `{*name}` segment, keyed by the shape of the path before it.
#[derive(Debug, PartialEq, Eq)]
struct Capture {
    prefix: String,
    token: String,
}

/// Check `path` against axum's route syntax and list its captures.
///
/// A segment is either static (no braces) or exactly one capture. A
/// catch-all `{*name}` must be the last segment.
fn parse_path(path: &str) -> Result<Vec<Capture>, LoadError> {
    let invalid = || LoadError::InvalidPath(path.to_string());
    let rest = path.strip_prefix('/').ok_or_else(invalid)?;

    let segments: Vec<&str> = rest.split('/').collect();
    let last = segments.len() - 1;
    let mut shape = String::from("/");
    let mut captures = Vec::new();

    for (i, segment) in segments.iter().enumerate() {
        // axum 0.8 rejects the old `:param` / `*rest` capture syntax at runtime.
        if segment.starts_with(':') || segment.starts_with('*') {
            return Err(invalid());
        }
        if segment.contains(['{', '}']) {
            let inner = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .ok_or_else(invalid)?;
            let (catch_all, name) = match inner.strip_prefix('*') {
                Some(name) => (true, name),
                None => (false, inner),
            };
            if name.is_empty() || name.contains(['{', '}', '*']) || (catch_all && i != last) {
                return Err(invalid());
            }
            captures.push(Capture {
                prefix: shape.clone(),
                token: segment.to_string(),
            });
            shape.push_str(if catch_all { "{*}" } else { "{}" });
        } else {
            shape.push_str(segment);
        }
        if i != last {
            shape.push('/');
        }
    }
    Ok(captures)
}

impl RouteTarget for AxumRouter {
    fn route(&mut self, verb: &str, path: &str, handlers: Vec<Handler>) -> Result<(), LoadError> {
        let filter = method_filter(verb).ok_or_else(|| LoadError::UnsupportedMethod {
            method: verb.to_string(),
            path: path.to_string(),
        })?;
        let captures = parse_path(path)?;

        let key = (verb.to_string(), path.to_string());
        if self.registered.contains(&key) {
            return Err(LoadError::DuplicateRoute {
                method: verb.to_uppercase(),
                path: path.to_string(),
            });
        }
        for capture in &captures {
            if let Some((token, existing)) = self.captures.get(&capture.prefix) {
                if *token != capture.token {
                    return Err(LoadError::ConflictingRoute {
                        path: path.to_string(),
                        existing: existing.clone(),
                    });
                }
            }
        }

        let chain = HandlerChain::new(handlers);
        debug!(verb, path, handlers = chain.len(), "Adding axum route");
        self.router = mem::take(&mut self.router).route(
            path,
            axum::routing::on(filter, move |req: Request| {
                let chain = chain.clone();
                async move { chain.call(req).await }
            }),
        );
        self.registered.insert(key);
        for capture in captures {
            self.captures
                .entry(capture.prefix)
                .or_insert_with(|| (capture.token, path.to_string()));
        }
        Ok(())
    }
}
