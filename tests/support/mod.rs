//! Loopback HTTP responder for client tests.
//!
//! Serves a fixed list of canned responses, one per connection, and reports
//! each request line (`GET /v1/... HTTP/1.1`) back to the test.
#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::{self, Receiver};
use std::thread;

pub struct Canned {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    /// Content-Length to announce; the body is cut short when it exceeds `body.len()`.
    pub declared_len: Option<usize>,
}

pub fn json(status: u16, body: &str) -> Canned {
    Canned {
        status,
        content_type: "application/json; charset=utf-8",
        body: body.to_string(),
        declared_len: None,
    }
}

pub fn text(status: u16, body: &str) -> Canned {
    Canned {
        status,
        content_type: "text/csv; charset=utf-8",
        body: body.to_string(),
        declared_len: None,
    }
}

/// A response that announces `declared_len` bytes but closes after `body`.
pub fn truncated(body: &str, declared_len: usize) -> Canned {
    Canned {
        declared_len: Some(declared_len),
        ..text(200, body)
    }
}

/// Start serving `responses` in order. Returns the base URL and a receiver of request lines.
pub fn serve(responses: Vec<Canned>) -> (String, Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for canned in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            let head = String::from_utf8_lossy(&head);
            let line = head.lines().next().unwrap_or_default().to_string();
            let _ = tx.send(line);
            let resp = format!(
                "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                canned.status,
                canned.content_type,
                canned.declared_len.unwrap_or(canned.body.len()),
                canned.body
            );
            let _ = stream.write_all(resp.as_bytes());
            let _ = stream.flush();
        }
    });
    (format!("http://{addr}"), rx)
}

pub const SUBJECT_TREE: &str = r#"[
  {"id":"02","description":"Population and elections","active":true,"hasSubjects":false,"subjects":[]},
  {"id":"05","description":"Living conditions","active":true,"hasSubjects":true,"subjects":[
    {"id":"3401","description":"Families","active":true,"hasSubjects":false,"subjects":[]},
    {"id":"3402","description":"Housing","active":false,"hasSubjects":false,"subjects":[]}
  ]}
]"#;

pub const TABLE_INFO: &str = r#"{
  "id":"FOLK1A",
  "text":"Population at the first day of the quarter",
  "description":"Population at the first day of the quarter by region, sex and time",
  "unit":"Number",
  "suppressedDataValue":"0",
  "updated":"2024-02-12T08:00:00",
  "active":true,
  "contacts":[{"name":"Dorthe Larsen","phone":"+4539173307","mail":"dla@dst.dk"}],
  "variables":[
    {"id":"OMRÅDE","text":"region","elimination":true,"time":false,"map":"denmark_municipality_07",
     "values":[{"id":"000","text":"All Denmark"},{"id":"101","text":"Copenhagen"}]},
    {"id":"KØN","text":"sex","elimination":true,"time":false,
     "values":[{"id":"TOT","text":"Total"},{"id":"1","text":"Men"}]},
    {"id":"Tid","text":"time","elimination":false,"time":true,
     "values":[{"id":"2020K1","text":"2020Q1"},{"id":"2020K2","text":"2020Q2"}]}
  ]
}"#;
