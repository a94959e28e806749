//! Wayfinder: convention-based controller discovery and route registration
//! over Axum.
//!
//! Controllers are plain types registered against the file that defines
//! them. The [`Loader`] walks a directory, looks up the controller for each
//! matching file and registers one route per declared action:
//!
//! | Declared action                          | File                | Route                   |
//! |------------------------------------------|---------------------|-------------------------|
//! | `get("info", ..)`                        | `user.rs`           | `GET /user/info`        |
//! | `get("index", ..).with_path("/board")`   | `admin/dash.rs`     | `GET /board`            |
//! | same, controller prefix `/v2`            | `admin/dash.rs`     | `GET /v2/board`         |
//!
//! ```ignore
//! use wayfinder::prelude::*;
//! ```

pub extern crate wayfinder_core;

pub use wayfinder_core::*;
