use http::Method;
use micro_hub::route::{get, post};
use micro_hub::{handler_fn, logging, DispatchContext, Environ, Hub, PathParams, Request};
use std::sync::Arc;
use tracing::Level;

fn hello(_ctx: &mut DispatchContext, _req: &Request, params: &PathParams) -> String {
    format!("hello {}", params.get("name").unwrap_or("world"))
}

fn sign(ctx: &mut DispatchContext, req: &Request, _params: &PathParams) {
    let name = req.input("name").and_then(|name| name.first()).unwrap_or("anonymous");
    ctx.append(format!("signed by {name}"));
}

fn main() -> micro_hub::Result<()> {
    logging::init(Level::INFO)?;

    let blog = Arc::new(
        Hub::builder()
            .route("/blog/w:slug/", get(handler_fn(|_ctx, _req, params| format!("post {}", params.get("slug").unwrap_or_default()))))
            .build()?,
    );

    let hub = Arc::new(
        Hub::builder()
            .route("/", get(handler_fn(hello)))
            .route("/hello/w:name/", get(handler_fn(hello)))
            .route("/guestbook/", post(handler_fn(sign)))
            .route("/blog/*:rest/", get(handler_fn(move |ctx, req, _params| ctx.delegate(&blog, req))))
            .assign(["/home/"], "/")
            .build()?,
    );

    let requests = [
        (Method::GET, "/", Environ::new()),
        (Method::GET, "/hello/rust", Environ::new()),
        (Method::POST, "/guestbook", Environ::new().with_form_data("name=ferris")?),
        (Method::GET, "/blog/first-post", Environ::new()),
        (Method::GET, "/blog/first", Environ::new()),
        (Method::GET, "/home", Environ::new()),
        (Method::GET, "/missing", Environ::new()),
    ];

    for (method, path, environ) in requests {
        let wire = hub.dispatch(path, &method, environ)?;
        println!("{method} {path} -> {} {:?}", wire.status_line(), String::from_utf8_lossy(wire.body()));
    }
    Ok(())
}
