//! Loader configuration: settings plus one replaceable hook per pipeline step.

use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;

use crate::action::Action;
use crate::config::{ConfigError, LoaderSettings};
use crate::controller::{ConstructOptions, ControllerClass, ControllerInstance, ControllerRegistry};
use crate::error::LoadError;
use crate::handler::Handler;
use crate::pipeline::{
    self, ControllerInstanceInfo, EnsurePathOptions, Pipeline, RegisterRouteOptions, RouteRecord,
};
use crate::resolver;
use crate::router::RouteTarget;
use crate::walker::FileInfo;

pub const DEFAULT_EXTENSION: &str = ".rs";

pub type GetClassFn =
    Arc<dyn Fn(&ControllerRegistry, &FileInfo) -> Option<ControllerClass> + Send + Sync>;
pub type InstantiateFn =
    Arc<dyn Fn(&ControllerClass, &ConstructOptions) -> Option<ControllerInstance> + Send + Sync>;
pub type FilterActionsFn = Arc<dyn Fn(Vec<Action>, &ControllerInstance) -> Vec<Action> + Send + Sync>;
pub type ProcessActionFn = Arc<
    dyn Fn(&mut Pipeline<'_>, &Action, &ControllerInstanceInfo) -> Result<Option<RouteRecord>, LoadError>
        + Send
        + Sync,
>;
pub type NormalizeMiddlewareFn = Arc<dyn Fn(Vec<Handler>) -> Vec<Handler> + Send + Sync>;
pub type EnsurePathFn = Arc<dyn Fn(&EnsurePathOptions<'_>) -> String + Send + Sync>;
pub type RegisterRouteFn = Arc<
    dyn Fn(&mut dyn RouteTarget, RegisterRouteOptions<'_>) -> Result<(), LoadError> + Send + Sync,
>;

/// Which walked files are considered controller modules.
#[derive(Clone)]
pub enum FileFilter {
    /// Files whose name ends with the configured extension. An empty
    /// extension accepts every file.
    Extension,
    /// Files whose absolute path matches the pattern.
    Pattern(Regex),
    Predicate(Arc<dyn Fn(&FileInfo) -> bool + Send + Sync>),
}

impl FileFilter {
    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(FileFilter::Pattern)
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&FileInfo) -> bool + Send + Sync + 'static,
    {
        FileFilter::Predicate(Arc::new(f))
    }

    pub fn matches(&self, file: &FileInfo, extension: &str) -> bool {
        match self {
            FileFilter::Extension => {
                extension.is_empty()
                    || file
                        .absolute_path
                        .file_name()
                        .is_some_and(|name| name.to_string_lossy().ends_with(extension))
            }
            FileFilter::Pattern(re) => re.is_match(&file.absolute_path.to_string_lossy()),
            FileFilter::Predicate(f) => f(file),
        }
    }
}

impl std::fmt::Debug for FileFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFilter::Extension => f.write_str("Extension"),
            FileFilter::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            FileFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Everything a [`Loader`](crate::Loader) can be configured with.
///
/// Every hook is always set; [`Default`] fills in the built-in behavior,
/// and each `with_*` setter replaces exactly one step.
#[derive(Clone)]
pub struct LoaderOptions {
    /// Base for relative scan roots. `None` means the process working directory.
    pub cwd: Option<PathBuf>,
    /// Stripped from file names to form `FileInfo::basename`.
    pub extension: String,
    pub file_filter: FileFilter,
    /// Skip controllers registered without options instead of treating
    /// them as having empty options.
    pub require_controller_decorator: bool,
    /// Passed unchanged to every controller constructor.
    pub construct_options: ConstructOptions,
    pub get_class: GetClassFn,
    pub instantiate: InstantiateFn,
    pub filter_actions: FilterActionsFn,
    pub process_action: ProcessActionFn,
    pub normalize_middleware: NormalizeMiddlewareFn,
    pub ensure_path: EnsurePathFn,
    pub register_route: RegisterRouteFn,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            extension: DEFAULT_EXTENSION.to_string(),
            file_filter: FileFilter::Extension,
            require_controller_decorator: false,
            construct_options: ConstructOptions::default(),
            get_class: Arc::new(resolver::get_class),
            instantiate: Arc::new(resolver::instantiate),
            filter_actions: Arc::new(|actions: Vec<Action>, _: &ControllerInstance| actions),
            process_action: Arc::new(pipeline::process_action),
            normalize_middleware: Arc::new(|middleware: Vec<Handler>| middleware),
            ensure_path: Arc::new(pipeline::ensure_path),
            register_route: Arc::new(pipeline::register_route),
        }
    }
}

impl LoaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply loader settings on top of the defaults.
    pub fn from_settings(settings: &LoaderSettings) -> Result<Self, ConfigError> {
        let mut options = Self {
            cwd: settings.cwd()?,
            extension: settings.extension()?,
            require_controller_decorator: settings.require_controller_decorator()?,
            ..Self::default()
        };
        if let Some(pattern) = settings.file_pattern()? {
            options.file_filter = FileFilter::pattern(&pattern)?;
        }
        Ok(options)
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_file_filter(mut self, filter: FileFilter) -> Self {
        self.file_filter = filter;
        self
    }

    pub fn with_require_controller_decorator(mut self, require: bool) -> Self {
        self.require_controller_decorator = require;
        self
    }

    pub fn with_construct_options(mut self, options: ConstructOptions) -> Self {
        self.construct_options = options;
        self
    }

    pub fn with_get_class<F>(mut self, f: F) -> Self
    where
        F: Fn(&ControllerRegistry, &FileInfo) -> Option<ControllerClass> + Send + Sync + 'static,
    {
        self.get_class = Arc::new(f);
        self
    }

    pub fn with_instantiate<F>(mut self, f: F) -> Self
    where
        F: Fn(&ControllerClass, &ConstructOptions) -> Option<ControllerInstance>
            + Send
            + Sync
            + 'static,
    {
        self.instantiate = Arc::new(f);
        self
    }

    pub fn with_filter_actions<F>(mut self, f: F) -> Self
    where
        F: Fn(Vec<Action>, &ControllerInstance) -> Vec<Action> + Send + Sync + 'static,
    {
        self.filter_actions = Arc::new(f);
        self
    }

    pub fn with_process_action<F>(mut self, f: F) -> Self
    where
        F: Fn(
                &mut Pipeline<'_>,
                &Action,
                &ControllerInstanceInfo,
            ) -> Result<Option<RouteRecord>, LoadError>
            + Send
            + Sync
            + 'static,
    {
        self.process_action = Arc::new(f);
        self
    }

    pub fn with_normalize_middleware<F>(mut self, f: F) -> Self
    where
        F: Fn(Vec<Handler>) -> Vec<Handler> + Send + Sync + 'static,
    {
        self.normalize_middleware = Arc::new(f);
        self
    }

    pub fn with_ensure_path<F>(mut self, f: F) -> Self
    where
        F: Fn(&EnsurePathOptions<'_>) -> String + Send + Sync + 'static,
    {
        self.ensure_path = Arc::new(f);
        self
    }

    pub fn with_register_route<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut dyn RouteTarget, RegisterRouteOptions<'_>) -> Result<(), LoadError>
            + Send
            + Sync
            + 'static,
    {
        self.register_route = Arc::new(f);
        self
    }
}

impl std::fmt::Debug for LoaderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderOptions")
            .field("cwd", &self.cwd)
            .field("extension", &self.extension)
            .field("file_filter", &self.file_filter)
            .field("require_controller_decorator", &self.require_controller_decorator)
            .field("construct_options", &self.construct_options)
            .finish_non_exhaustive()
    }
}
