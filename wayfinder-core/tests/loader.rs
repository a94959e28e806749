use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wayfinder_core::config::{ConfigError, LoaderSettings};
use wayfinder_core::http::{Request, StatusCode};
use wayfinder_core::pipeline;
use wayfinder_core::{
    from_fn, Action, ConstructOptions, Controller, ControllerClass, ControllerOptions,
    ControllerRegistry, FileFilter, Handler, LoadError, Loader, LoaderOptions, Next, RouteTarget,
};

/// Route target that only records what it was given.
#[derive(Default)]
struct Recorder {
    routes: Vec<(String, String, usize)>,
}

impl RouteTarget for Recorder {
    fn route(&mut self, verb: &str, path: &str, handlers: Vec<Handler>) -> Result<(), LoadError> {
        self.routes
            .push((verb.to_string(), path.to_string(), handlers.len()));
        Ok(())
    }
}

impl Recorder {
    fn paths(&self) -> Vec<(&str, &str)> {
        self.routes
            .iter()
            .map(|(verb, path, _)| (verb.as_str(), path.as_str()))
            .collect()
    }
}

struct User;

impl Controller for User {
    fn construct(_: &ConstructOptions) -> Option<Self> {
        Some(User)
    }
}

impl User {
    async fn info(self: Arc<Self>, _req: Request) -> &'static str {
        "info"
    }

    async fn update_info(self: Arc<Self>, _req: Request) -> StatusCode {
        StatusCode::NO_CONTENT
    }

    async fn secret(self: Arc<Self>, _req: Request) -> &'static str {
        "secret"
    }
}

struct Dashboard;

impl Controller for Dashboard {
    fn construct(_: &ConstructOptions) -> Option<Self> {
        Some(Dashboard)
    }
}

impl Dashboard {
    async fn index(self: Arc<Self>, _req: Request) -> &'static str {
        "dashboard"
    }
}

/// Only constructed when `enabled` is set in the construct options.
struct Feature;

impl Controller for Feature {
    fn construct(options: &ConstructOptions) -> Option<Self> {
        options.get_as::<bool>("enabled")?.then_some(Feature)
    }
}

impl Feature {
    async fn status(self: Arc<Self>, _req: Request) -> &'static str {
        "on"
    }
}

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "").unwrap();
}

fn tree(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        touch(dir.path(), file);
    }
    dir
}

fn user_and_dashboard() -> ControllerRegistry {
    let mut registry = ControllerRegistry::new();
    registry
        .controller::<User>("user")
        .get("info", User::info)
        .patch("updateInfo", User::update_info);
    registry
        .controller::<Dashboard>("admin/dashboard")
        .annotate(ControllerOptions::new().prefix("/v2"))
        .action(Action::get("index", Dashboard::index).with_path("/dashboard"));
    registry
}

fn load(
    registry: ControllerRegistry,
    options: LoaderOptions,
    dir: &Path,
) -> (Recorder, wayfinder_core::LoadSummary) {
    let mut loader = Loader::new(registry, Recorder::default(), options);
    let summary = loader.load(dir).unwrap();
    (loader.into_router(), summary)
}

#[test]
fn registers_convention_and_prefixed_routes() {
    let dir = tree(&["user.rs", "admin/dashboard.rs"]);
    let (router, summary) = load(user_and_dashboard(), LoaderOptions::default(), dir.path());

    assert_eq!(
        router.paths(),
        vec![
            ("get", "/v2/dashboard"),
            ("get", "/user/info"),
            ("patch", "/user/updateInfo"),
        ]
    );
    assert_eq!(summary.controllers, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.routes.len(), 3);
    assert_eq!(summary.routes[1].method, "GET");
    assert_eq!(summary.routes[1].controller, "User");
    assert_eq!(summary.routes[2].method, "PATCH");
}

#[test]
fn chain_ends_with_bound_action() {
    let dir = tree(&["user.rs"]);
    let (router, _) = load(user_and_dashboard(), LoaderOptions::default(), dir.path());
    assert!(router.routes.iter().all(|(_, _, len)| *len == 1));
}

#[test]
fn prefix_is_ignored_for_convention_paths() {
    let dir = tree(&["admin/dashboard.rs"]);
    let mut registry = ControllerRegistry::new();
    registry
        .controller::<Dashboard>("admin/dashboard")
        .annotate(ControllerOptions::new().prefix("/v2"))
        .get("index", Dashboard::index);
    let (router, _) = load(registry, LoaderOptions::default(), dir.path());
    assert_eq!(router.paths(), vec![("get", "/admin/dashboard/index")]);
}

#[test]
fn explicit_path_without_prefix_is_used_verbatim() {
    let dir = tree(&["admin/dashboard.rs"]);
    let mut registry = ControllerRegistry::new();
    registry
        .controller::<Dashboard>("admin/dashboard")
        .action(Action::get("index", Dashboard::index).with_path("/home"));
    let (router, _) = load(registry, LoaderOptions::default(), dir.path());
    assert_eq!(router.paths(), vec![("get", "/home")]);
}

#[test]
fn empty_explicit_path_falls_back_to_convention() {
    let dir = tree(&["admin/dashboard.rs"]);
    let mut registry = ControllerRegistry::new();
    registry
        .controller::<Dashboard>("admin/dashboard")
        .annotate(ControllerOptions::new().prefix("/v2"))
        .action(Action::get("index", Dashboard::index).with_path(""));
    let (router, _) = load(registry, LoaderOptions::default(), dir.path());
    assert_eq!(router.paths(), vec![("get", "/admin/dashboard/index")]);
}

#[test]
fn actions_register_in_declaration_order() {
    let dir = tree(&["user.rs"]);
    let mut registry = ControllerRegistry::new();
    registry
        .controller::<User>("user")
        .delete("c", User::info)
        .get("a", User::info)
        .put("b", User::info)
        .post("d", User::info)
        .options("e", User::info)
        .head("f", User::info);
    let (router, summary) = load(registry, LoaderOptions::default(), dir.path());
    assert_eq!(
        router.paths(),
        vec![
            ("delete", "/user/c"),
            ("get", "/user/a"),
            ("put", "/user/b"),
            ("post", "/user/d"),
            ("options", "/user/e"),
            ("head", "/user/f"),
        ]
    );
    let paths: Vec<_> = summary.routes.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["/user/c", "/user/a", "/user/b", "/user/d", "/user/e", "/user/f"]);
}

#[test]
fn verbs_are_upper_cased_on_declaration_and_lower_cased_on_registration() {
    let dir = tree(&["user.rs"]);
    let mut registry = ControllerRegistry::new();
    registry.controller::<User>("user").http("Patch", "info", User::info);
    let (router, summary) = load(registry, LoaderOptions::default(), dir.path());
    assert_eq!(router.paths(), vec![("patch", "/user/info")]);
    assert_eq!(summary.routes[0].method, "PATCH");
}

#[test]
fn filter_actions_selects_subset_in_order() {
    let dir = tree(&["user.rs"]);
    let mut registry = ControllerRegistry::new();
    registry
        .controller::<User>("user")
        .get("info", User::info)
        .get("secret", User::secret)
        .patch("updateInfo", User::update_info);
    let options = LoaderOptions::default().with_filter_actions(|actions, instance| {
        assert!(instance.downcast_ref::<User>().is_some());
        actions.into_iter().filter(|a| a.name() != "secret").collect()
    });
    let (router, _) = load(registry, options, dir.path());
    assert_eq!(
        router.paths(),
        vec![("get", "/user/info"), ("patch", "/user/updateInfo")]
    );
}

#[test]
fn collector_veto_only_affects_that_action() {
    let dir = tree(&["user.rs", "admin/dashboard.rs"]);
    let mut registry = user_and_dashboard();
    registry.controller::<User>("user").get("secret", User::secret);

    let later_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&later_calls);

    let mut loader = Loader::new(registry, Recorder::default(), LoaderOptions::default());
    loader
        .add_middleware_collector(|ctx, _middleware| ctx.action.name() != "secret")
        .add_middleware_collector(move |ctx, _middleware| {
            assert_ne!(ctx.action.name(), "secret");
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
    let summary = loader.load(dir.path()).unwrap();

    assert_eq!(summary.vetoed, 1);
    assert_eq!(later_calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        loader.router().paths(),
        vec![
            ("get", "/v2/dashboard"),
            ("get", "/user/info"),
            ("patch", "/user/updateInfo"),
        ]
    );
}

#[test]
fn collectors_contribute_middleware_in_order() {
    let dir = tree(&["user.rs"]);
    let mut registry = ControllerRegistry::new();
    registry.controller::<User>("user").get("info", User::info);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&seen);
    let second = Arc::clone(&seen);

    let mut loader = Loader::new(registry, Recorder::default(), LoaderOptions::default());
    loader
        .add_middleware_collector(move |ctx, middleware| {
            first.lock().unwrap().push(format!("a:{}", middleware.len()));
            assert_eq!(ctx.class_name, "User");
            assert!(ctx.controller::<User>().is_some());
            middleware.push(from_fn(|req: Request, next: Next| next.run(req)));
            true
        })
        .add_middleware_collector(move |_ctx, middleware| {
            second.lock().unwrap().push(format!("b:{}", middleware.len()));
            middleware.push(from_fn(|req: Request, next: Next| next.run(req)));
            true
        });
    loader.load(dir.path()).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["a:0", "b:1"]);
    assert_eq!(loader.router().routes[0].2, 3);
}

#[test]
fn collectors_see_controller_options() {
    let dir = tree(&["admin/dashboard.rs"]);
    let mut registry = ControllerRegistry::new();
    registry
        .controller::<Dashboard>("admin/dashboard")
        .annotate(ControllerOptions::new().with("auth", "admin"))
        .get("index", Dashboard::index);

    let mut loader = Loader::new(registry, Recorder::default(), LoaderOptions::default());
    loader.add_middleware_collector(|ctx, _| ctx.option("auth").is_none());
    let summary = loader.load(dir.path()).unwrap();
    assert_eq!(summary.vetoed, 1);
    assert!(summary.routes.is_empty());
    assert_eq!(summary.controllers, 1);
}

#[test]
fn unannotated_controller_is_skipped_when_annotation_required() {
    let dir = tree(&["user.rs", "admin/dashboard.rs"]);
    let options = LoaderOptions::default().with_require_controller_decorator(true);
    let (router, summary) = load(user_and_dashboard(), options, dir.path());
    assert_eq!(router.paths(), vec![("get", "/v2/dashboard")]);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn unannotated_controller_uses_empty_options_by_default() {
    let dir = tree(&["user.rs"]);
    let mut registry = ControllerRegistry::new();
    registry
        .controller::<User>("user")
        .action(Action::get("info", User::info).with_path("/me"));
    let (router, summary) = load(registry, LoaderOptions::default(), dir.path());
    assert_eq!(router.paths(), vec![("get", "/me")]);
    assert_eq!(summary.controllers, 1);
}

#[test]
fn constructor_opt_out_skips_controller() {
    let dir = tree(&["feature.rs"]);
    let register = || {
        let mut registry = ControllerRegistry::new();
        registry
            .controller::<Feature>("feature")
            .get("status", Feature::status);
        registry
    };

    let (router, summary) = load(register(), LoaderOptions::default(), dir.path());
    assert!(router.routes.is_empty());
    assert_eq!(summary.skipped, 1);

    let options = LoaderOptions::default()
        .with_construct_options(ConstructOptions::new().with("enabled", true));
    let (router, summary) = load(register(), options, dir.path());
    assert_eq!(router.paths(), vec![("get", "/feature/status")]);
    assert_eq!(summary.controllers, 1);
}

#[test]
fn controller_without_actions_is_skipped() {
    let dir = tree(&["admin/dashboard.rs"]);
    let mut registry = ControllerRegistry::new();
    registry
        .controller::<Dashboard>("admin/dashboard")
        .annotate(ControllerOptions::new().prefix("/v2"));
    let (router, summary) = load(registry, LoaderOptions::default(), dir.path());
    assert!(router.routes.is_empty());
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.controllers, 0);
}

#[test]
fn unregistered_and_filtered_files_register_nothing() {
    let dir = tree(&["user.rs", "orphan.rs", "notes.txt"]);
    let (router, summary) = load(user_and_dashboard(), LoaderOptions::default(), dir.path());
    assert_eq!(router.routes.len(), 2);
    // notes.txt never reaches the resolver.
    assert_eq!(summary.skipped, 1);
}

#[test]
fn pattern_filter_and_extension() {
    let dir = tree(&["user.ctl", "user.rs", "admin/dashboard.ctl"]);
    let options = LoaderOptions::default()
        .with_extension(".ctl")
        .with_file_filter(FileFilter::pattern(r"user\.ctl$").unwrap());
    let (router, summary) = load(user_and_dashboard(), options, dir.path());
    assert_eq!(
        router.paths(),
        vec![("get", "/user/info"), ("patch", "/user/updateInfo")]
    );
    assert_eq!(summary.skipped, 0);
}

#[test]
fn relative_root_resolves_against_cwd_option() {
    let dir = tree(&["api/user.rs"]);
    let options = LoaderOptions::default().with_cwd(dir.path());
    let (router, _) = load(user_and_dashboard(), options, Path::new("api"));
    assert_eq!(
        router.paths(),
        vec![("get", "/user/info"), ("patch", "/user/updateInfo")]
    );
}

#[test]
fn missing_root_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut loader = Loader::new(
        user_and_dashboard(),
        Recorder::default(),
        LoaderOptions::default(),
    );
    let err = loader.load(dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, LoadError::Walk { .. }));
    assert!(loader.router().routes.is_empty());
}

#[test]
fn action_declared_for_another_controller_is_rejected() {
    let dir = tree(&["user.rs"]);
    let mut registry = ControllerRegistry::new();
    registry
        .controller::<User>("user")
        .action(Action::get("index", Dashboard::index));
    let mut loader = Loader::new(registry, Recorder::default(), LoaderOptions::default());
    let err = loader.load(dir.path()).unwrap_err();
    match err {
        LoadError::HandlerMismatch { controller, action } => {
            assert_eq!(controller, "User");
            assert_eq!(action, "index");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn router_errors_abort_load() {
    struct Refusing;
    impl RouteTarget for Refusing {
        fn route(&mut self, verb: &str, path: &str, _: Vec<Handler>) -> Result<(), LoadError> {
            Err(LoadError::UnsupportedMethod {
                method: verb.to_string(),
                path: path.to_string(),
            })
        }
    }

    let dir = tree(&["user.rs"]);
    let mut loader = Loader::new(user_and_dashboard(), Refusing, LoaderOptions::default());
    let err = loader.load(dir.path()).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedMethod { ref method, .. } if method == "get"));
}

#[test]
fn ensure_path_hook_replaces_derivation() {
    let dir = tree(&["user.rs"]);
    let options = LoaderOptions::default().with_ensure_path(|opts| {
        format!("/{}/{}", opts.class_name.to_lowercase(), opts.action.name().to_lowercase())
    });
    let (router, _) = load(user_and_dashboard(), options, dir.path());
    assert_eq!(
        router.paths(),
        vec![("get", "/user/info"), ("patch", "/user/updateinfo")]
    );
}

#[test]
fn register_route_hook_receives_full_context() {
    let dir = tree(&["admin/dashboard.rs"]);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&calls);
    let options = LoaderOptions::default().with_register_route(move |router, opts| {
        log.lock().unwrap().push(format!(
            "{} {} {} {:?}",
            opts.controller_name,
            opts.action.method(),
            opts.path,
            opts.options.prefix
        ));
        pipeline::register_route(router, opts)
    });
    let (router, _) = load(user_and_dashboard(), options, dir.path());
    assert_eq!(router.paths(), vec![("get", "/v2/dashboard")]);
    assert_eq!(
        *calls.lock().unwrap(),
        vec![r#"Dashboard GET /v2/dashboard Some("/v2")"#]
    );
}

#[test]
fn normalize_middleware_runs_before_action_is_appended() {
    let dir = tree(&["user.rs"]);
    let mut registry = ControllerRegistry::new();
    registry.controller::<User>("user").get("info", User::info);

    let options = LoaderOptions::default().with_normalize_middleware(|mut middleware| {
        assert_eq!(middleware.len(), 1);
        middleware.push(from_fn(|req: Request, next: Next| next.run(req)));
        middleware
    });
    let mut loader = Loader::new(registry, Recorder::default(), options);
    loader.add_middleware_collector(|_, middleware| {
        middleware.push(from_fn(|req: Request, next: Next| next.run(req)));
        true
    });
    loader.load(dir.path()).unwrap();
    assert_eq!(loader.router().routes[0].2, 3);
}

#[test]
fn get_class_and_instantiate_hooks_are_used() {
    let dir = tree(&["anything.rs"]);
    let constructed = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&constructed);

    let mut registry = ControllerRegistry::new();
    registry.define::<User>().get("info", User::info);

    let options = LoaderOptions::default()
        .with_get_class(|_, file| (file.basename == "anything").then(ControllerClass::of::<User>))
        .with_instantiate(move |class, options| {
            count.fetch_add(1, Ordering::SeqCst);
            class.construct(options)
        });
    let (router, _) = load(registry, options, dir.path());
    assert_eq!(router.paths(), vec![("get", "/anything/info")]);
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
}

#[test]
fn process_action_hook_replaces_step() {
    let dir = tree(&["user.rs"]);
    let options = LoaderOptions::default().with_process_action(|steps, action, info| {
        if action.method() == "PATCH" {
            return Ok(None);
        }
        pipeline::process_action(steps, action, info)
    });
    let (router, summary) = load(user_and_dashboard(), options, dir.path());
    assert_eq!(router.paths(), vec![("get", "/user/info")]);
    assert_eq!(summary.vetoed, 1);
}

#[test]
fn reload_is_deterministic() {
    let dir = tree(&["user.rs", "admin/dashboard.rs", "admin/zeta.rs"]);
    let (first, _) = load(user_and_dashboard(), LoaderOptions::default(), dir.path());
    let (second, _) = load(user_and_dashboard(), LoaderOptions::default(), dir.path());
    assert_eq!(first.paths(), second.paths());
}

#[test]
fn loader_from_settings_applies_extension_and_pattern() {
    let yaml = "wayfinder:\n  extension: .ctl\n  file_pattern: 'user\\.ctl$'\n";
    let settings = LoaderSettings::from_yaml_str(yaml, "test").unwrap();
    let dir = tree(&["user.ctl", "admin/dashboard.ctl", "user.rs"]);

    let Ok(mut loader) = Loader::from_settings(user_and_dashboard(), Recorder::default(), &settings)
    else {
        panic!("valid settings were rejected");
    };
    let summary = loader.load(dir.path()).unwrap();
    assert_eq!(summary.controllers, 1);
    assert_eq!(
        loader.into_router().paths(),
        vec![("get", "/user/info"), ("patch", "/user/updateInfo")]
    );
}

#[test]
fn loader_from_settings_reports_invalid_pattern() {
    let settings =
        LoaderSettings::from_yaml_str("wayfinder:\n  file_pattern: '(oops'\n", "test").unwrap();
    match Loader::from_settings(user_and_dashboard(), Recorder::default(), &settings) {
        Err(LoadError::Config(ConfigError::InvalidPattern { pattern, .. })) => {
            assert_eq!(pattern, "(oops")
        }
        Err(other) => panic!("expected a config error, got {other}"),
        Ok(_) => panic!("invalid pattern was accepted"),
    }
    assert!(matches!(
        Loader::axum_from_settings(user_and_dashboard(), &settings),
        Err(LoadError::Config(_))
    ));
}
