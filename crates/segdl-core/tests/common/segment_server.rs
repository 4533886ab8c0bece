//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves numbered segments `/v/clip.mp4/seg-{id}-v1-a1.ts` for ids up to
//! `last_id` and a 404 "Not Found" page past it. `/watch` returns an HTML page
//! linking the master playlist on the same host.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

pub const SEGMENT_LEN: usize = 1024;

/// Deterministic body for segment `id`.
pub fn segment_body(id: u64) -> Vec<u8> {
    (0..SEGMENT_LEN).map(|i| (id as usize + i) as u8).collect()
}

/// Concatenation of segments `first..=last`.
pub fn expected_file(first: u64, last: u64) -> Vec<u8> {
    (first..=last).flat_map(segment_body).collect()
}

/// Starts a server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345"). The server runs until the process exits.
pub fn start(last_id: u64) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let base = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    let page_base = base.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let page_base = page_base.clone();
            thread::spawn(move || handle(stream, last_id, &page_base));
        }
    });
    base
}

fn handle(mut stream: TcpStream, last_id: u64, base: &str) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 4096];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    let (status, body) = if path == "/watch" {
        let page = format!(
            "<html><script>var player = {{ hls: \"{base}/v/clip.mp4/master.m3u8\" }};</script>\
             <img src=\"{base}/v/clip.mp4.jpg\"></html>"
        );
        ("200 OK", page.into_bytes())
    } else if path == "/empty" {
        ("200 OK", b"<html>nothing here</html>".to_vec())
    } else {
        match segment_id(path) {
            Some(id) if id <= last_id => ("200 OK", segment_body(id)),
            _ => ("404 Not Found", b"<html><h1>Not Found</h1></html>".to_vec()),
        }
    };
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}

fn segment_id(path: &str) -> Option<u64> {
    path.strip_prefix("/v/clip.mp4/seg-")?
        .strip_suffix("-v1-a1.ts")?
        .parse()
        .ok()
}
