//! Integration tests for the `may_minihttp` adapter: real sockets, real
//! coroutines, one server per test on a free port.

use std::sync::Arc;
use switchyard::controller::{Controller, Payload};
use switchyard::dispatcher::{Dispatcher, Response};
use switchyard::ids::RequestId;
use switchyard::registry::ControllerRegistry;
use switchyard::route::RouteTable;
use switchyard::server::{AppService, HttpServer, ServerHandle};

mod common;
use common::http::{get, send_request};
use common::test_server::{free_addr, setup_may_runtime};

/// Stops the server when the test ends, pass or fail.
struct TestServer {
    handle: Option<ServerHandle>,
}

impl TestServer {
    fn start(service: AppService) -> Self {
        setup_may_runtime();
        let handle = HttpServer(service).start(free_addr()).unwrap();
        handle.wait_ready().unwrap();
        Self {
            handle: Some(handle),
        }
    }

    fn addr(&self) -> std::net::SocketAddr {
        self.handle.as_ref().unwrap().addr()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

fn dispatcher() -> Arc<Dispatcher> {
    let registry = ControllerRegistry::new();
    registry.register(
        Controller::builder("MainController")
            .action_with_arity("index", 0, Some(0), |_| Ok(Payload::from("Hello, World!")))
            .action("page", |_| {
                Ok(Payload::from("<html>\n   <body>\n\n     <p>hi</p>\n   </body>\n</html>\n"))
            })
            .action("echo", |ctx| {
                Ok(format!("{}:{}", ctx.request.method, ctx.param("name").unwrap_or("-")).into())
            })
            .action("moved", |_| {
                Ok(Response::text(301, "").with_header("Location", "/").into())
            })
            .action("rid", |ctx| Ok(ctx.request_id().to_string().into()))
            .action("chunks", |_| {
                let parts = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
                Ok(Payload::Stream(Box::new(parts.into_iter())))
            })
            .build(),
    );
    registry.resolve_mount_table();
    Arc::new(Dispatcher::new(RouteTable::new(), Arc::new(registry)))
}

#[test]
fn test_hello_world_over_http() {
    let server = TestServer::start(AppService::new(dispatcher()));
    let resp = get(server.addr(), "/");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "Hello, World!");
    assert_eq!(resp.header("content-type"), Some("text/html"));
}

#[test]
fn test_not_found_over_http() {
    let server = TestServer::start(AppService::new(dispatcher()));
    let resp = get(server.addr(), "/nope/nope");
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, "404 Not Found");
}

#[test]
fn test_query_and_form_params() {
    let server = TestServer::start(AppService::new(dispatcher()));
    let resp = get(server.addr(), "/echo?name=ada");
    assert_eq!(resp.body, "GET:ada");

    let body = "name=grace";
    let resp = send_request(
        server.addr(),
        &format!(
            "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
    );
    assert_eq!(resp.body, "POST:grace");
}

#[test]
fn test_tidy_collapses_html_whitespace() {
    let server = TestServer::start(AppService::new(dispatcher()).with_tidy(true));
    let tidy = get(server.addr(), "/page");
    assert_eq!(tidy.status, 200);
    assert!(!tidy.body.contains("\n\n"));
    assert!(tidy.body.contains("<p>hi</p>"));
}

#[test]
fn test_response_payload_headers_written() {
    let server = TestServer::start(AppService::new(dispatcher()).with_benchmark(true));
    let resp = get(server.addr(), "/moved");
    assert_eq!(resp.status, 301);
    assert_eq!(resp.header("location"), Some("/"));
}

#[test]
fn test_stream_payload_is_drained() {
    let server = TestServer::start(AppService::new(dispatcher()));
    let resp = get(server.addr(), "/chunks");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "abc");
}

#[test]
fn test_upstream_request_id_reaches_action() {
    let server = TestServer::start(AppService::new(dispatcher()));
    let upstream = RequestId::new().to_string();
    let resp = send_request(
        server.addr(),
        &format!(
            "GET /rid HTTP/1.1\r\nHost: localhost\r\nX-Request-Id: {upstream}\r\nConnection: close\r\n\r\n"
        ),
    );
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, upstream);

    let minted = get(server.addr(), "/rid");
    assert!(minted.body.parse::<RequestId>().is_ok());
    assert_ne!(minted.body, upstream);
}
