use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// Minimal canned-response HTTP server for exercising the fetcher against
/// 200/304/500 outcomes without touching the network.
pub struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub etag: Option<String>,
    pub body: String,
}

impl StubServer {
    pub fn spawn(routes: HashMap<String, StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { return };
                handle(stream, &routes, &log);
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Raw request heads seen so far, in arrival order.
    pub fn request_heads(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, StubResponse>, log: &Arc<Mutex<Vec<String>>>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut head = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }
        if line == "\r\n" {
            break;
        }
        head.push_str(&line);
    }
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    log.lock().unwrap().push(head);

    let not_found = StubResponse {
        status: 404,
        etag: None,
        body: String::new(),
    };
    let response = render(routes.get(&path).unwrap_or(&not_found));
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn render(response: &StubResponse) -> String {
    let reason = match response.status {
        200 => "OK",
        304 => "Not Modified",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    let mut out = format!("HTTP/1.1 {} {reason}\r\nconnection: close\r\n", response.status);
    if let Some(etag) = &response.etag {
        out.push_str(&format!("etag: {etag}\r\n"));
    }
    if response.status == 304 {
        out.push_str("\r\n");
    } else {
        out.push_str(&format!("content-length: {}\r\n\r\n", response.body.len()));
        out.push_str(&response.body);
    }
    out
}
