// tests/dev_server.rs

use std::error::Error;
use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use assetpipe::server::{inject_script, serve_on, ReloadHandle, CLIENT_PATH, EVENTS_PATH};
use assetpipe::types::AssetClass;
use assetpipe_test_utils::project::TempProject;
use assetpipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const SCRIPT_TAG: &str = r#"<script src="/__assetpipe/client.js"></script>"#;

async fn start_server(project: &TempProject, reload: ReloadHandle) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let root = project.path("dist");
    tokio::spawn(async move {
        let _ = serve_on(listener, root, reload).await;
    });
    Ok(addr)
}

/// Plain HTTP/1.1 GET; returns the raw response (head and body).
async fn get(addr: SocketAddr, path: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Read from `stream` until `needle` shows up in what was received so far.
async fn read_until(stream: &mut TcpStream, seen: &mut String, needle: &str) -> std::io::Result<()> {
    let mut chunk = [0u8; 1024];
    while !seen.contains(needle) {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("connection closed before {needle:?}"),
            ));
        }
        seen.push_str(&String::from_utf8_lossy(&chunk[..n]));
    }
    Ok(())
}

#[test]
fn script_goes_before_the_closing_body() {
    assert_eq!(
        inject_script("<html><body><p>x</p></body></html>"),
        format!("<html><body><p>x</p>{SCRIPT_TAG}</body></html>")
    );
    assert_eq!(
        inject_script("<BODY>x</BODY>"),
        format!("<BODY>x{SCRIPT_TAG}</BODY>")
    );
    assert_eq!(inject_script("<p>fragment</p>"), format!("<p>fragment</p>{SCRIPT_TAG}"));
}

#[test]
fn reload_without_clients_is_not_an_error() {
    let reload = ReloadHandle::new();
    assert_eq!(reload.client_count(), 0);
    assert_eq!(reload.notify(AssetClass::Html, vec!["index.html".to_string()]), 0);
}

#[tokio::test]
async fn html_pages_get_the_client_script() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("dist/index.html", "<html><body><h1>Hi</h1></body></html>");
    project.write("dist/css/main.css", "body{color:red}");

    let addr = start_server(&project, ReloadHandle::new()).await?;

    let page = with_timeout(get(addr, "/")).await?;
    assert!(page.starts_with("HTTP/1.1 200"), "response: {page}");
    assert!(page.contains(&format!("<h1>Hi</h1>{SCRIPT_TAG}</body>")), "response: {page}");

    let css = with_timeout(get(addr, "/css/main.css")).await?;
    assert!(css.starts_with("HTTP/1.1 200"), "response: {css}");
    assert!(css.ends_with("body{color:red}"), "response: {css}");
    assert!(!css.contains("<script"));

    let missing = with_timeout(get(addr, "/nope.html")).await?;
    assert!(missing.starts_with("HTTP/1.1 404"), "response: {missing}");
    Ok(())
}

#[tokio::test]
async fn client_script_subscribes_to_events() -> TestResult {
    let project = TempProject::new();
    project.write("dist/index.html", "<p>x</p>");
    let addr = start_server(&project, ReloadHandle::new()).await?;

    let script = with_timeout(get(addr, CLIENT_PATH)).await?;
    assert!(script.starts_with("HTTP/1.1 200"), "response: {script}");
    assert!(script.contains("text/javascript"));
    assert!(script.contains(&format!("new EventSource(\"{EVENTS_PATH}\")")));
    Ok(())
}

#[tokio::test]
async fn connected_clients_receive_reload_events() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    project.write("dist/index.html", "<p>x</p>");
    let reload = ReloadHandle::new();
    let addr = start_server(&project, reload.clone()).await?;

    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {EVENTS_PATH} HTTP/1.1\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut seen = String::new();
    with_timeout(read_until(&mut stream, &mut seen, "event: connected")).await?;
    assert!(seen.contains("text/event-stream"), "response: {seen}");
    assert_eq!(reload.client_count(), 1);

    let delivered = reload.notify(AssetClass::Style, vec!["css/main.css".to_string()]);
    assert_eq!(delivered, 1);

    with_timeout(read_until(&mut stream, &mut seen, "event: reload")).await?;
    with_timeout(read_until(&mut stream, &mut seen, r#""paths":["css/main.css"]"#)).await?;
    assert!(seen.contains(r#""scope":"css""#), "stream: {seen}");
    assert!(seen.contains(r#""class":"style""#), "stream: {seen}");

    Ok(())
}
