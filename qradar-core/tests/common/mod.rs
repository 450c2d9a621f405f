//! Local stand-in for the QRadar offense endpoint
#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const OFFENSES_111: &str = include_str!("../data/offenses_111.json");
pub const OFFENSES_CORRUPTED: &str = include_str!("../data/offenses_corrupted.json");
pub const OFFENSES_SINGLE_OPEN: &str = include_str!("../data/offenses_single_open.json");

pub fn json_reply(body: &str) -> String {
    reply("200 OK", body)
}

pub fn reply(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    )
}

pub struct MockQRadar {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockQRadar {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Request heads (request line + headers) in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_head(stream: &mut TcpStream) -> String {
    let _ = stream.set_read_timeout(Some(Duration::from_millis(500)));

    // GET requests carry no body; stop at end-of-headers.
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    loop {
        match stream.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&tmp[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
                if buf.len() > 16 * 1024 {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serve `routes` (ip, full HTTP reply) until the test process exits.
/// Requests for unknown IPs get an empty offense list.
pub fn spawn_qradar(routes: Vec<(&'static str, String)>) -> MockQRadar {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);

    let seen = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let seen = Arc::clone(&seen);
            let routes = Arc::clone(&routes);
            thread::spawn(move || {
                let head = read_head(&mut stream);
                let request_line = head.lines().next().unwrap_or_default().to_string();
                let response = routes
                    .iter()
                    .find(|(ip, _)| request_line.contains(&format!("%22{}%22", ip)))
                    .map(|(_, r)| r.clone())
                    .unwrap_or_else(|| json_reply("[]"));
                seen.lock().unwrap().push(head);
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            });
        }
    });

    MockQRadar { addr, requests }
}
