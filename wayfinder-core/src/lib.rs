//! Controller discovery and route registration.
//!
//! A [`Loader`] walks a directory tree, resolves each matching file to the
//! controller registered for it in a [`ControllerRegistry`], and registers
//! one route per declared [`Action`] with a [`RouteTarget`]. Every step of
//! that pipeline is a hook on [`LoaderOptions`].

pub mod action;
pub mod collector;
pub mod config;
pub mod controller;
pub mod error;
pub mod handler;
pub mod http;
pub mod loader;
pub mod logging;
pub mod metadata;
pub mod options;
pub mod path;
pub mod pipeline;
pub mod prelude;
pub mod resolver;
pub mod router;
pub mod walker;

pub use action::Action;
pub use collector::{CollectContext, MiddlewareCollector};
pub use config::{ConfigError, ConfigValue, FromConfigValue, LoaderSettings};
pub use controller::{
    ConstructOptions, Controller, ControllerClass, ControllerDef, ControllerInstance,
    ControllerOptions, ControllerRegistry,
};
pub use error::{error_response, HttpError, LoadError};
pub use handler::{endpoint, from_fn, BoxFuture, Handler, HandlerChain, Next};
pub use loader::{LoadSummary, Loader};
pub use logging::init_tracing;
pub use metadata::{ClassMetadata, MetadataStore};
pub use options::{FileFilter, LoaderOptions};
pub use pipeline::{
    ControllerInstanceInfo, EnsurePathOptions, Pipeline, RegisterRouteOptions, RouteRecord,
};
pub use router::{AxumRouter, RouteTarget};
pub use walker::FileInfo;
