// End-to-end dispatch scenarios through the public API

use hyper::{Method, StatusCode};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use switchyard::config::Config;
use switchyard::error::RouterError;
use switchyard::handler::{handle, App};
use switchyard::http::{BufferedResponse, DefaultErrorPages, Request, ResponseSink};
use switchyard::routing::{MethodFilter, Router, Scope};

type Calls = Arc<Mutex<Vec<(&'static str, Vec<String>)>>>;

fn site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let data: Vec<u8> = (0..100u8).collect();
    fs::write(root.join("data.bin"), &data).unwrap();
    fs::write(root.join("config.PHP"), "<?php ?>").unwrap();
    fs::create_dir(root.join("docs")).unwrap();
    fs::write(root.join("docs/index.html"), "<h1>docs</h1>").unwrap();
    fs::write(root.join("docs/notes.txt"), "notes").unwrap();
    fs::create_dir(root.join("empty")).unwrap();
    fs::write(root.join("empty/readme.txt"), "readme").unwrap();
    dir
}

fn app(root: &TempDir) -> App {
    let mut config = Config::load_from("/nonexistent/switchyard-config").unwrap();
    config.static_files.root = root.path().to_str().unwrap().to_string();
    config.logging.access_log = false;
    App::new(&config).unwrap()
}

fn get(uri: &str) -> Request {
    Request::new(Method::GET, uri, "localhost")
}

#[test]
fn newest_route_runs_first_and_continue_reaches_older() {
    let router = Router::new();
    let calls = Calls::default();

    let log = Arc::clone(&calls);
    router
        .route(Method::GET, r"/user/(\d+)", move |_, args| {
            log.lock().unwrap().push(("h1", args.to_vec()));
            Ok(())
        })
        .unwrap();
    let log = Arc::clone(&calls);
    router
        .route(Method::GET, r"/user/(\d+)", move |ctx, args| {
            log.lock().unwrap().push(("h2", args.to_vec()));
            ctx.continue_dispatch();
            Ok(())
        })
        .unwrap();

    let mut res = BufferedResponse::new();
    router.dispatch(&get("/user/42"), &mut res).unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            ("h2", vec!["42".to_string()]),
            ("h1", vec!["42".to_string()])
        ]
    );
}

#[test]
fn continue_past_last_match_is_no_route() {
    let router = Router::new();
    router
        .route(Method::GET, "^/only$", |ctx, _| {
            ctx.continue_dispatch();
            Ok(())
        })
        .unwrap();

    let mut res = BufferedResponse::new();
    let result = router.dispatch(&get("/only"), &mut res);
    assert!(matches!(result, Err(RouterError::NoRoute)));

    // The top-level handler turns it into the route-not-found page
    let res = handle(&router, &DefaultErrorPages::default(), &get("/only"));
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(String::from_utf8_lossy(res.body()).contains("Route Not Found"));
}

#[test]
fn host_and_base_scope_routes() {
    let router = Router::new();
    router
        .group(Scope::new().with_host("a.example").with_base("/api/"), |r| {
            r.route(MethodFilter::Any, r"^v(\d+)/status$", |ctx, args| {
                let body = format!("api v{}", args[0]);
                ctx.response().write(body.as_bytes())?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    let mut res = BufferedResponse::new();
    router
        .dispatch(&Request::new(Method::GET, "/api/v2/status", "a.example"), &mut res)
        .unwrap();
    assert_eq!(res.body(), b"api v2");

    let mut res = BufferedResponse::new();
    let other_host = router.dispatch(&Request::new(Method::GET, "/api/v2/status", "b.example"), &mut res);
    assert!(matches!(other_host, Err(RouterError::NoRoute)));

    let mut res = BufferedResponse::new();
    let outside_base = router.dispatch(&Request::new(Method::GET, "/v2/status", "a.example"), &mut res);
    assert!(matches!(outside_base, Err(RouterError::NoRoute)));
}

#[test]
fn byte_ranges() {
    let root = site();
    let app = app(&root);

    let res = app.handle(&get("/data.bin").with_header("Range", "bytes=0-"), "127.0.0.1");
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.header("content-range"), Some("bytes 0-99/100"));
    assert_eq!(res.body().len(), 100);

    let res = app.handle(&get("/data.bin").with_header("Range", "bytes=10-19"), "127.0.0.1");
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.body(), (10..20u8).collect::<Vec<_>>().as_slice());

    let res = app.handle(&get("/data.bin").with_header("Range", "bytes=200-210"), "127.0.0.1");
    assert_eq!(res.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert!(res.body().is_empty());
}

#[test]
fn denied_extensions_are_not_found() {
    let root = site();
    let app = app(&root);

    for uri in ["/config.PHP", "/missing.sql", "/config.php?x=1"] {
        let res = app.handle(&get(uri).with_header("Range", "bytes=0-3"), "127.0.0.1");
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
        assert!(!res.body().starts_with(b"<?php"), "{uri}");
    }
}

#[test]
fn directory_index_resolution() {
    let root = site();
    let app = app(&root);

    let res = app.handle(&get("/docs/"), "127.0.0.1");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body(), b"<h1>docs</h1>");

    let res = app.handle(&get("/empty"), "127.0.0.1");
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[test]
fn traversal_stays_inside_root() {
    let outer = tempfile::tempdir().unwrap();
    fs::write(outer.path().join("secret.txt"), "top secret").unwrap();
    let root = outer.path().join("www");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("page.txt"), "public").unwrap();

    let mut config = Config::load_from("/nonexistent/switchyard-config").unwrap();
    config.static_files.root = root.to_str().unwrap().to_string();
    config.logging.access_log = false;
    let app = App::new(&config).unwrap();

    for uri in ["/../secret.txt", "/..%2fsecret.txt", "/....//secret.txt", "/x/../../secret.txt"] {
        let res = app.handle(&get(uri), "127.0.0.1");
        assert_ne!(res.body(), b"top secret", "{uri}");
    }
    assert_eq!(app.handle(&get("/page.txt"), "127.0.0.1").body(), b"public");
}
