//! The loader: walk a directory, resolve controllers, register their actions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::collector::{CollectContext, MiddlewareCollector};
use crate::config::LoaderSettings;
use crate::controller::{ControllerOptions, ControllerRegistry};
use crate::error::LoadError;
use crate::handler::Handler;
use crate::http::Router;
use crate::options::LoaderOptions;
use crate::pipeline::{ControllerInstanceInfo, Pipeline, RouteRecord};
use crate::router::{AxumRouter, RouteTarget};
use crate::walker::{self, FileInfo};

/// Outcome of one [`Loader::load`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Registered routes, in registration order.
    pub routes: Vec<RouteRecord>,
    /// Controllers whose actions were processed.
    pub controllers: usize,
    /// Matching files that yielded no controller to process.
    pub skipped: usize,
    /// Actions vetoed by a middleware collector.
    pub vetoed: usize,
}

enum ClassOutcome {
    Loaded(Box<ControllerInstanceInfo>),
    Skipped,
}

/// Discovers controllers under a directory and registers their actions with
/// a [`RouteTarget`].
///
/// # Example
///
/// ```ignore
/// let mut registry = ControllerRegistry::new();
/// registry
///     .controller::<User>("user")
///     .get("info", User::info)
///     .patch("updateInfo", User::update_info);
///
/// let mut loader = Loader::axum(registry, LoaderOptions::default());
/// loader.add_middleware_collector(|_ctx, middleware| {
///     middleware.push(from_fn(require_token));
///     true
/// });
/// loader.load("src/api")?;
/// let app: axum::Router = loader.into_axum_router();
/// ```
pub struct Loader<R = AxumRouter> {
    registry: ControllerRegistry,
    router: R,
    options: LoaderOptions,
    collectors: Vec<Arc<dyn MiddlewareCollector>>,
}

impl Loader<AxumRouter> {
    /// A loader registering routes on a fresh [`AxumRouter`].
    pub fn axum(registry: ControllerRegistry, options: LoaderOptions) -> Self {
        Self::new(registry, AxumRouter::new(), options)
    }

    /// A loader on a fresh [`AxumRouter`], configured from `settings`.
    pub fn axum_from_settings(
        registry: ControllerRegistry,
        settings: &LoaderSettings,
    ) -> Result<Self, LoadError> {
        Self::from_settings(registry, AxumRouter::new(), settings)
    }

    pub fn into_axum_router(self) -> Router {
        self.router.into_router()
    }
}

impl<R: RouteTarget> Loader<R> {
    pub fn new(registry: ControllerRegistry, router: R, options: LoaderOptions) -> Self {
        Self {
            registry,
            router,
            options,
            collectors: Vec::new(),
        }
    }

    /// Build the loader options from `settings`. Invalid settings surface as
    /// [`LoadError::Config`].
    pub fn from_settings(
        registry: ControllerRegistry,
        router: R,
        settings: &LoaderSettings,
    ) -> Result<Self, LoadError> {
        let options = LoaderOptions::from_settings(settings)?;
        Ok(Self::new(registry, router, options))
    }

    /// Append a collector closure. Collectors run in the order they were added.
    pub fn add_middleware_collector<F>(&mut self, collect: F) -> &mut Self
    where
        F: Fn(&CollectContext<'_>, &mut Vec<Handler>) -> bool + Send + Sync + 'static,
    {
        self.collectors.push(Arc::new(collect));
        self
    }

    /// Append a collector implemented as a type.
    pub fn add_collector<C: MiddlewareCollector + 'static>(&mut self, collector: C) -> &mut Self {
        self.collectors.push(Arc::new(collector));
        self
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    pub fn into_router(self) -> R {
        self.router
    }

    /// Scan `path` and register every discovered action.
    ///
    /// A relative `path` is resolved against `options.cwd`, or the process
    /// working directory when unset. Controllers are processed in walk
    /// order; actions of one controller in declaration order.
    ///
    /// # Errors
    ///
    /// The first [`LoadError`] aborts the pass. Routes registered before it
    /// stay on the router.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadSummary, LoadError> {
        let root = self.resolve_root(path.as_ref())?;
        debug!(root = %root.display(), extension = %self.options.extension, "Scanning for controllers");

        let filter = &self.options.file_filter;
        let extension = self.options.extension.as_str();
        let files = walker::walk(
            &root,
            &|file: &FileInfo| filter.matches(file, extension),
            extension,
        )?;

        let mut summary = LoadSummary::default();
        for file in files {
            match self.process_class(file) {
                ClassOutcome::Loaded(info) => {
                    summary.controllers += 1;
                    self.process_instance(&info, &mut summary)?;
                }
                ClassOutcome::Skipped => summary.skipped += 1,
            }
        }

        info!(
            routes = summary.routes.len(),
            controllers = summary.controllers,
            skipped = summary.skipped,
            "Controllers loaded"
        );
        Ok(summary)
    }

    fn resolve_root(&self, path: &Path) -> Result<PathBuf, LoadError> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let base = match &self.options.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir().map_err(|source| LoadError::Walk {
                path: path.to_path_buf(),
                source,
            })?,
        };
        Ok(base.join(path))
    }

    fn process_class(&self, file: FileInfo) -> ClassOutcome {
        let Some(class) = (self.options.get_class)(&self.registry, &file) else {
            return ClassOutcome::Skipped;
        };
        let class_name = class.name();
        let metadata = self.registry.metadata();

        let options = match metadata.controller_options(class.type_id()) {
            Some(options) => options.clone(),
            None if self.options.require_controller_decorator => {
                debug!(controller = class_name, "Controller is not annotated, skipping");
                return ClassOutcome::Skipped;
            }
            None => ControllerOptions::default(),
        };

        let Some(instance) = (self.options.instantiate)(&class, &self.options.construct_options)
        else {
            debug!(controller = class_name, "Controller construction opted out, skipping");
            return ClassOutcome::Skipped;
        };

        let Some(actions) = metadata.actions(class.type_id()) else {
            debug!(controller = class_name, "Controller declares no actions, skipping");
            return ClassOutcome::Skipped;
        };
        let actions = (self.options.filter_actions)(actions.to_vec(), &instance);

        ClassOutcome::Loaded(Box::new(ControllerInstanceInfo {
            file,
            class_name: class_name.to_string(),
            class,
            options,
            instance,
            actions,
        }))
    }

    fn process_instance(
        &mut self,
        info: &ControllerInstanceInfo,
        summary: &mut LoadSummary,
    ) -> Result<(), LoadError> {
        let process_action = Arc::clone(&self.options.process_action);
        let mut pipeline = Pipeline::new(&self.options, &self.collectors, &mut self.router);
        for action in &info.actions {
            match process_action(&mut pipeline, action, info)? {
                Some(route) => summary.routes.push(route),
                None => summary.vetoed += 1,
            }
        }
        Ok(())
    }
}
