//! A raw TCP server that answers each connection according to a script, for
//! failures mockito cannot produce (dropped and stalled connections).

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub enum Step {
    /// Read the request, then close the socket without answering.
    Drop,
    /// Answer with the given status and JSON body.
    Respond(u16, &'static str),
    /// Read the request and never answer; counts the socket as closed once
    /// the client goes away.
    Stall,
}

pub struct ScriptedServer {
    pub url: String,
    requests: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedServer {
    /// Connections follow `steps` in order; the last step repeats.
    pub async fn start(steps: Vec<Step>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));

        let server = Self {
            url,
            requests: Arc::clone(&requests),
            closed: Arc::clone(&closed),
        };

        tokio::spawn(async move {
            let mut index = 0;
            while let Ok((socket, _)) = listener.accept().await {
                let step = steps[index.min(steps.len() - 1)].clone();
                index += 1;
                tokio::spawn(handle(
                    socket,
                    step,
                    Arc::clone(&requests),
                    Arc::clone(&closed),
                ));
            }
        });

        server
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

async fn handle(
    mut socket: TcpStream,
    step: Step,
    requests: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
) {
    if !read_request(&mut socket).await {
        return;
    }
    requests.fetch_add(1, Ordering::SeqCst);

    match step {
        Step::Drop => drop(socket),
        Step::Respond(status, body) => {
            let response = format!(
                "HTTP/1.1 {} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        Step::Stall => {
            let mut buf = [0u8; 1024];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => continue,
                }
            }
            closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Reads one HTTP request (headers plus `content-length` body).
async fn read_request(socket: &mut TcpStream) -> bool {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return false,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&data[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return false,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
    true
}

/// Polls `condition` until it holds or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    wait_until(Duration::from_secs(2), condition).await
}

/// Polls `condition` every 20ms until it holds or `limit` passes.
pub async fn wait_until<F: Fn() -> bool>(limit: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// Runs `future` and reports whether it finished within `limit`.
pub async fn finishes_within<F: Future>(limit: Duration, future: F) -> Option<F::Output> {
    tokio::time::timeout(limit, future).await.ok()
}
