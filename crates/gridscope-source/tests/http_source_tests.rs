// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use gridscope_app::{FieldValue, RowKey};
use gridscope_source::HttpSource;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

#[test]
fn unreachable_service_error_is_actionable() {
    let source = HttpSource::new("http://127.0.0.1:1/api", Duration::from_millis(50))
        .expect("source should initialize");

    let error = source
        .fetch_grid_data()
        .expect_err("fetch should fail for unreachable endpoint");
    let message = format!("{error:#}");
    assert!(message.contains("source.base_url"), "got {message}");
}

#[test]
fn fetch_grid_data_decodes_rows() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/grid");
        let body = r#"[
            {"key":"1","type":"Type1","label":"Label1"},
            {"key":2,"type":"Type2","label":"Label2","total":10.5,"analysts":["Ann"]}
        ]"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let source = HttpSource::new(&addr, Duration::from_secs(1))?;
    let rows = source.fetch_grid_data()?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].key, RowKey::from("1"));
    assert_eq!(rows[1].key, RowKey::from("2"));
    assert_eq!(rows[1].fields.get("total"), Some(&FieldValue::Decimal(10.5)));
    assert_eq!(rows[1].cell("analysts").as_deref(), Some("Ann"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn fetch_item_details_hits_keyed_path() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/grid/item%201");
        request
            .respond(json_response(
                r#"{"detail":"Item Details","rating":4}"#,
                200,
            ))
            .expect("response should succeed");
    });

    let source = HttpSource::new(&addr, Duration::from_secs(1))?;
    let payload = source.fetch_item_details(&RowKey::from("item 1"))?;
    assert_eq!(
        payload.get("detail"),
        Some(&FieldValue::from("Item Details"))
    );
    assert_eq!(payload.get("rating"), Some(&FieldValue::Integer(4)));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn null_and_boolean_cells_keep_the_dataset() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let body = r#"[{"key":"1","label":"A","note":null},{"key":"2","active":true}]"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let source = HttpSource::new(&addr, Duration::from_secs(1))?;
    let rows = source.fetch_grid_data()?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].fields.get("note"), Some(&FieldValue::Null));
    assert_eq!(rows[1].fields.get("active"), Some(&FieldValue::Bool(true)));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn non_success_status_is_reported_with_body() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"error":"no such item"}"#, 404))
            .expect("response should succeed");
    });

    let source = HttpSource::new(&addr, Duration::from_secs(1))?;
    let error = source
        .fetch_item_details(&RowKey::from("missing"))
        .expect_err("404 should fail");
    let message = error.to_string();
    assert!(message.contains("404"), "got {message}");
    assert!(message.contains("no such item"), "got {message}");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn malformed_rows_fail_to_decode() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"[{"label":"no key"}]"#, 200))
            .expect("response should succeed");
    });

    let source = HttpSource::new(&addr, Duration::from_secs(1))?;
    let error = source
        .fetch_grid_data()
        .expect_err("rows without key should fail");
    let message = format!("{error:#}");
    assert!(message.contains("decode grid rows"), "got {message}");
    assert!(message.contains(r#"[{"label":"no key"}]"#), "got {message}");
    assert!(message.contains("missing field `key`"), "got {message}");

    handle.join().expect("server thread should join");
    Ok(())
}
