//! Local storage-node stand-ins for client tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A peer that answers every request with the same raw response and keeps
/// what it was sent.
pub struct TestServer {
    port:     u16,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
    accepted: Arc<AtomicUsize>,
    task:     JoinHandle<()>,
}

impl TestServer {
    pub async fn reply(response: impl Into<Vec<u8>>) -> Self {
        let response = Arc::new(response.into());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));

        let task = {
            let requests = requests.clone();
            let accepted = accepted.clone();
            tokio::spawn(async move {
                while let Ok((mut stream, _)) = listener.accept().await {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    let requests = requests.clone();
                    let response = response.clone();
                    tokio::spawn(async move {
                        let request = read_request(&mut stream).await;
                        requests.lock().unwrap().push(request);
                        let _ = stream.write_all(&response).await;
                        let _ = stream.shutdown().await;
                    });
                }
            })
        };

        Self {
            port,
            requests,
            accepted,
            task,
        }
    }

    pub async fn ok(body: &[u8]) -> Self {
        let mut response = format!("HTTP/1.0 200 OK\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
        response.extend_from_slice(body);
        Self::reply(response).await
    }

    pub async fn status(line: &str) -> Self { Self::reply(format!("HTTP/1.0 {line}\r\n\r\n")).await }

    pub fn url(&self, path: &str) -> String { format!("http://127.0.0.1:{}{}", self.port, path) }

    pub fn accepted(&self) -> usize { self.accepted.load(Ordering::SeqCst) }

    pub fn requests(&self) -> Vec<Vec<u8>> { self.requests.lock().unwrap().clone() }

    pub fn request_text(&self) -> String {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        String::from_utf8_lossy(&requests[0]).into_owned()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) { self.task.abort(); }
}

/// A URL on a port nothing listens on.
pub async fn dead_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}{path}")
}

async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; 64 * 1024];
    let mut body_end = None;
    loop {
        if body_end.is_none()
            && let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n")
        {
            let head = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
            let len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            body_end = Some(pos + 4 + len);
        }
        if body_end.is_some_and(|end| buf.len() >= end) {
            return buf;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return buf,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}
