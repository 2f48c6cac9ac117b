//! Mock HTTP server for adapter tests
//!
//! Serves canned responses by request path so the remote dataset source
//! and the chat-completion describer can be exercised without network
//! access. Unrouted paths answer 404. Every raw request is kept for
//! inspection.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Canned response for one route
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
    pub delay_ms: u64,
}

impl MockResponse {
    pub fn ok(content_type: &str, body: &str) -> Self {
        Self {
            status: 200,
            content_type: content_type.to_string(),
            body: body.to_string(),
            delay_ms: 0,
        }
    }

    pub fn json(body: &str) -> Self {
        Self::ok("application/json", body)
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "application/json".to_string(),
            body: format!(r#"{{"error": "HTTP {}"}}"#, status),
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

type Routes = Arc<Vec<(String, MockResponse)>>;

pub struct MockServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<String>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl MockServer {
    /// Start on a random local port
    pub fn start(routes: Vec<(&str, MockResponse)>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        listener.set_nonblocking(true)?;

        let routes: Routes = Arc::new(
            routes
                .into_iter()
                .map(|(path, response)| (path.to_string(), response))
                .collect(),
        );
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let running_clone = running.clone();
        let requests_clone = requests.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let routes = routes.clone();
                        let requests = requests_clone.clone();
                        thread::spawn(move || handle_connection(stream, &routes, &requests));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Raw requests received so far (request line, headers and body)
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read headers, then as much body as Content-Length announces
fn read_request(stream: &mut TcpStream) -> Option<String> {
    stream.set_nonblocking(false).ok()?;
    stream.set_read_timeout(Some(Duration::from_secs(5))).ok()?;

    let mut data = Vec::new();
    let mut buffer = [0u8; 4096];
    loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.trim()
                        .eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    Some(String::from_utf8_lossy(&data).into_owned())
}

fn handle_connection(mut stream: TcpStream, routes: &Routes, requests: &Mutex<Vec<String>>) {
    let Some(request) = read_request(&mut stream) else {
        return;
    };

    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("")
        .split('?')
        .next()
        .unwrap_or("")
        .to_string();

    if let Ok(mut log) = requests.lock() {
        log.push(request);
    }

    match routes.iter().find(|(p, _)| *p == path) {
        Some((_, response)) => {
            if response.delay_ms > 0 {
                thread::sleep(Duration::from_millis(response.delay_ms));
            }
            send_response(&mut stream, response.status, &response.content_type, &response.body);
        }
        None => send_response(
            &mut stream,
            404,
            "application/json",
            r#"{"error": "Not found"}"#,
        ),
    }
}

fn send_response(stream: &mut TcpStream, status: u16, content_type: &str, body: &str) {
    let status_text = match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        content_type,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
