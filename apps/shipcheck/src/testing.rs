//! Test-only helpers: a scripted HTTP/1.1 peer on a local port.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Answers each connection with the next scripted `(status, body)`; the last
/// entry repeats once the script runs out. Every request is recorded.
pub struct ScriptedServer {
    port: u16,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedServer {
    pub fn start(script: Vec<(u16, &str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = ScriptedServer::idle(port);
        server.serve(move || listener, owned(script));
        server
    }

    /// Like `start`, but binds `port` only after `delay` has passed.
    pub fn start_on(port: u16, delay: Duration, script: Vec<(u16, &str)>) -> Self {
        let server = ScriptedServer::idle(port);
        server.serve(
            move || {
                thread::sleep(delay);
                TcpListener::bind(("127.0.0.1", port)).unwrap()
            },
            owned(script),
        );
        server
    }

    fn idle(port: u16) -> Self {
        ScriptedServer {
            port,
            hits: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn serve(&self, listen: impl FnOnce() -> TcpListener + Send + 'static, script: Vec<(u16, String)>) {
        let (hits, requests) = (self.hits.clone(), self.requests.clone());
        thread::spawn(move || {
            let listener = listen();
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let n = hits.fetch_add(1, Ordering::SeqCst);
                let request = read_request(&mut stream);
                requests.lock().unwrap().push(request);
                let (code, body) = &script[n.min(script.len() - 1)];
                let reply = format!(
                    "HTTP/1.1 {code} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    if *code == 200 { "OK" } else { "Scripted" },
                    body.len()
                );
                let _ = stream.write_all(reply.as_bytes());
                let _ = stream.flush();
            }
        });
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Raw requests received so far (head and body).
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn owned(script: Vec<(u16, &str)>) -> Vec<(u16, String)> {
    script
        .into_iter()
        .map(|(code, body)| (code, body.to_string()))
        .collect()
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let Ok(n) = stream.read(&mut chunk) else { break };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// A local port with nothing listening on it.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
