use http::{Method, StatusCode};
use micro_hub::route::{any, get};
use micro_hub::{handler_fn, Environ, Hub, HubConfig, HubError, Response, WireResponse};
use serde_json::json;
use std::sync::Arc;

fn body(wire: &WireResponse) -> &str {
    std::str::from_utf8(wire.body()).unwrap()
}

fn named(name: &str) -> HubConfig {
    let mut config = HubConfig::default();
    config.set("name", json!(name)).unwrap();
    config
}

fn active_name(ctx: &micro_hub::DispatchContext) -> String {
    ctx.config_value("name").and_then(|name| name.as_str().map(str::to_owned)).unwrap_or_else(|| "none".to_owned())
}

// specific routes first, `w:slug` would swallow them
fn blog_hub(config: HubConfig) -> Arc<Hub> {
    Arc::new(
        Hub::builder()
            .config(config)
            .route(
                "/blog/written/",
                get(handler_fn(|ctx, _req, _params| {
                    ctx.append("written by child");
                })),
            )
            .route(
                "/blog/broken/",
                get(handler_fn(|ctx, _req, _params| -> Result<(), HubError> {
                    ctx.append("half");
                    Err(HubError::render("child broke"))
                })),
            )
            .route(
                "/blog/moved/",
                get(handler_fn(|_ctx, _req, _params| -> Result<Response, HubError> {
                    let mut response = Response::new();
                    response.set_status(StatusCode::MOVED_PERMANENTLY).try_header("Location", "/new/")?;
                    Ok(response)
                })),
            )
            .route(
                "/blog/w:slug/",
                get(handler_fn(|ctx, _req, params| {
                    format!("post {} from {}", params.get("slug").unwrap_or_default(), active_name(ctx))
                })),
            )
            .build()
            .unwrap(),
    )
}

fn site_hub(blog: Arc<Hub>) -> Arc<Hub> {
    Arc::new(
        Hub::builder()
            .config(named("site"))
            .route(
                "/blog/*:rest/",
                any(handler_fn(move |ctx, req, _params| -> Result<(), HubError> {
                    ctx.append("[");
                    let outcome = ctx.delegate(&blog, req);
                    ctx.append(format!("] after={} nested={}", active_name(ctx), ctx.in_nutshell()));
                    outcome
                })),
            )
            .build()
            .unwrap(),
    )
}

#[test]
fn delegate_runs_child_table_and_restores_parent() {
    let site = site_hub(blog_hub(named("blog")));

    let wire = site.dispatch("/blog/hello", &Method::GET, Environ::new()).unwrap();
    assert_eq!(wire.status_line(), "200 OK");
    assert_eq!(body(&wire), "[post hello from blog] after=site nested=false");
}

#[test]
fn child_output_written_through_context_appears_once() {
    let site = site_hub(blog_hub(named("blog")));

    let wire = site.dispatch("/blog/written/", &Method::GET, Environ::new()).unwrap();
    assert_eq!(body(&wire), "[written by child] after=site nested=false");
    assert_eq!(wire.header("content-length"), Some(wire.body().len().to_string().as_str()));
}

#[test]
fn child_response_status_and_headers_are_spliced() {
    let site = site_hub(blog_hub(named("blog")));

    let wire = site.dispatch("/blog/moved/", &Method::GET, Environ::new()).unwrap();
    assert_eq!(wire.status_line(), "301 Moved Permanently");
    assert_eq!(wire.header("location"), Some("/new/"));
}

#[test]
fn child_not_found_is_spliced() {
    let site = site_hub(blog_hub(named("blog")));

    let wire = site.dispatch("/blog/a-b/", &Method::GET, Environ::new()).unwrap();
    assert_eq!(wire.status_line(), "404 Not Found");
    assert_eq!(body(&wire), "[Not Found: No matching routes registered] after=site nested=false");
}

#[test]
fn contained_child_failure_keeps_parent_output() {
    let site = site_hub(blog_hub(named("blog")));

    let wire = site.dispatch("/blog/broken/", &Method::GET, Environ::new()).unwrap();
    assert_eq!(wire.status_line(), "500 Internal Server Error");

    let text = body(&wire);
    assert!(text.starts_with("[500 Internal Server Error"));
    assert!(text.contains("child broke"));
    assert!(!text.contains("half"));
    assert!(text.ends_with("] after=site nested=false"));
}

#[test]
fn raised_child_failure_restores_parent_before_propagating() {
    let mut config = named("blog");
    config.raise_errors = true;
    let site = site_hub(blog_hub(config));

    // the parent contains the failure its handler returns, after the child was unwound
    let wire = site.dispatch("/blog/broken/", &Method::GET, Environ::new()).unwrap();
    assert_eq!(wire.status_line(), "500 Internal Server Error");
    assert!(body(&wire).contains("handler failed: template error: child broke"));

    let wire = site.dispatch("/blog/hello/", &Method::GET, Environ::new()).unwrap();
    assert_eq!(body(&wire), "[post hello from blog] after=site nested=false");
}

#[test]
fn nested_delegation_is_refused() {
    let inner = Arc::new(Hub::builder().route("/", any(handler_fn(|_ctx, _req, _params| "inner"))).build().unwrap());
    let middle = Arc::new(
        Hub::builder()
            .config(named("middle"))
            .route(
                "/*:rest/",
                any(handler_fn(move |ctx, req, _params| {
                    let error = ctx.delegate(&inner, req).err();
                    format!("refused={}", error.is_some_and(|e| e.is_nutshell_violation()))
                })),
            )
            .build()
            .unwrap(),
    );
    let site = site_hub(middle);

    let wire = site.dispatch("/blog/x/", &Method::GET, Environ::new()).unwrap();
    assert_eq!(body(&wire), "[refused=true] after=site nested=false");
}

#[test]
fn manual_nutshell_swaps_the_active_hub() {
    let substitute = Arc::new(Hub::builder().config(named("substitute")).build().unwrap());
    let hub = Arc::new(
        Hub::builder()
            .config(named("outer"))
            .route(
                "/swap/",
                get(handler_fn(move |ctx, _req, _params| -> Result<String, HubError> {
                    let mut trace = vec![active_name(ctx)];

                    ctx.enter_nutshell()?;
                    trace.push(format!("{}:{}", active_name(ctx), ctx.hub().is_none()));
                    trace.push(ctx.enter_nutshell().err().is_some_and(|e| e.is_nutshell_violation()).to_string());

                    ctx.install_hub(Arc::clone(&substitute))?;
                    trace.push(active_name(ctx));
                    trace.push(ctx.install_hub(Arc::clone(&substitute)).is_err().to_string());

                    ctx.exit_nutshell();
                    trace.push(format!("{}:{}", active_name(ctx), ctx.in_nutshell()));
                    Ok(trace.join(" "))
                })),
            )
            .build()
            .unwrap(),
    );

    let wire = hub.dispatch("/swap/", &Method::GET, Environ::new()).unwrap();
    assert_eq!(body(&wire), "outer none:true true substitute true outer:false");
}

#[test]
fn exit_without_enter_is_harmless() {
    let hub = Arc::new(
        Hub::builder()
            .config(named("only"))
            .route(
                "/",
                get(handler_fn(|ctx, _req, _params| {
                    ctx.exit_nutshell();
                    active_name(ctx)
                })),
            )
            .build()
            .unwrap(),
    );

    let wire = hub.dispatch("/", &Method::GET, Environ::new()).unwrap();
    assert_eq!(body(&wire), "only");
}
