//! Throwaway HTTP peers for transport tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Clone)]
enum Behavior {
    /// Read the full request, send the reply, close.
    Reply(Vec<u8>),
    /// Read the request and never answer.
    Silent,
    /// Close as soon as the connection is accepted.
    Hangup,
    /// Announce and keep writing a body of the given length until the
    /// client stops reading.
    Flood(u64),
}

/// A local peer that records every request it receives.
pub struct TestServer {
    port:     u16,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
    accepted: Arc<AtomicUsize>,
    gone:     Arc<AtomicBool>,
    task:     JoinHandle<()>,
}

impl TestServer {
    pub async fn reply(response: impl Into<Vec<u8>>) -> Self {
        Self::spawn(Behavior::Reply(response.into())).await
    }

    pub async fn ok(body: &[u8]) -> Self {
        let mut response = format!("HTTP/1.0 200 OK\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
        response.extend_from_slice(body);
        Self::reply(response).await
    }

    pub async fn status(line: &str) -> Self { Self::reply(format!("HTTP/1.0 {line}\r\n\r\n")).await }

    pub async fn silent() -> Self { Self::spawn(Behavior::Silent).await }

    pub async fn hangup() -> Self { Self::spawn(Behavior::Hangup).await }

    pub async fn flood(len: u64) -> Self { Self::spawn(Behavior::Flood(len)).await }

    async fn spawn(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));
        let gone = Arc::new(AtomicBool::new(false));

        let task = {
            let requests = requests.clone();
            let accepted = accepted.clone();
            let gone = gone.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    let requests = requests.clone();
                    let behavior = behavior.clone();
                    let gone = gone.clone();
                    tokio::spawn(async move { serve(stream, behavior, requests, gone).await });
                }
            })
        };

        Self {
            port,
            requests,
            accepted,
            gone,
            task,
        }
    }

    pub fn port(&self) -> u16 { self.port }

    pub fn url(&self, path: &str) -> String { format!("http://127.0.0.1:{}{}", self.port, path) }

    pub fn accepted(&self) -> usize { self.accepted.load(Ordering::SeqCst) }

    /// Whether a flooding peer has seen its client close the connection.
    pub fn peer_gone(&self) -> bool { self.gone.load(Ordering::SeqCst) }

    pub fn requests(&self) -> Vec<Vec<u8>> { self.requests.lock().unwrap().clone() }

    /// The single request received, as text.
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

async fn serve(
    mut stream: TcpStream,
    behavior: Behavior,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
    gone: Arc<AtomicBool>,
) {
    if matches!(behavior, Behavior::Hangup) {
        return;
    }
    let request = read_request(&mut stream).await;
    requests.lock().unwrap().push(request);
    match behavior {
        Behavior::Reply(response) => {
            let _ = stream.write_all(&response).await;
            let _ = stream.shutdown().await;
        }
        Behavior::Silent => tokio::time::sleep(Duration::from_secs(3600)).await,
        Behavior::Flood(len) => {
            let head = format!("HTTP/1.0 200 OK\r\nContent-Length: {len}\r\n\r\n");
            if stream.write_all(head.as_bytes()).await.is_err() {
                gone.store(true, Ordering::SeqCst);
                return;
            }
            let chunk = vec![b'f'; 64 * 1024];
            let mut sent = 0u64;
            while sent < len {
                let n = (len - sent).min(chunk.len() as u64) as usize;
                if stream.write_all(&chunk[..n]).await.is_err() {
                    gone.store(true, Ordering::SeqCst);
                    return;
                }
                sent += n as u64;
            }
        }
        Behavior::Hangup => {}
    }
}

/// Read a request head plus a `Content-Length` body.
async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; 64 * 1024];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return buf,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
    let body_len = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + body_len {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    buf
}
