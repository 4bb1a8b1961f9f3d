// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

async fn parse(raw: &str) -> Result<HttpResponse, JenkinsError> {
    let mut reader = BufReader::new(raw.as_bytes());
    read_http_response(&mut reader).await
}

#[tokio::test]
async fn content_length_body() {
    let response = parse("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello").await.unwrap();
    assert_eq!(response, HttpResponse { status: 200, body: "hello".into() });
}

#[tokio::test]
async fn content_length_is_case_insensitive() {
    let response = parse("HTTP/1.1 201 Created\r\ncontent-LENGTH: 2\r\n\r\nokEXTRA").await.unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn chunked_body_with_trailer() {
    let raw = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5;ext=1\r\npedia\r\n0\r\nX-Trailer: y\r\n\r\n";
    let response = parse(raw).await.unwrap();
    assert_eq!(response.body, "Wikipedia");
}

#[tokio::test]
async fn body_until_close_without_length() {
    let response = parse("HTTP/1.1 404 Not Found\r\n\r\nmissing").await.unwrap();
    assert_eq!(response, HttpResponse { status: 404, body: "missing".into() });
}

#[tokio::test]
async fn bad_status_line_is_transport_error() {
    let err = parse("garbage\r\n\r\n").await.unwrap_err();
    assert!(matches!(err, JenkinsError::Transport(_)));
}

#[yare::parameterized(
    host_only   = { "http://jenkins",                 "jenkins:80",            "jenkins",            "" },
    host_port   = { "http://jenkins-svc:8080",        "jenkins-svc:8080",      "jenkins-svc:8080",   "" },
    with_prefix = { "http://10.0.0.1:8080/jenkins/",  "10.0.0.1:8080",         "10.0.0.1:8080",      "/jenkins" },
)]
fn endpoint_parse(url: &str, addr: &str, host: &str, prefix: &str) {
    let endpoint = Endpoint::parse(url).unwrap();
    assert_eq!(endpoint.addr, addr);
    assert_eq!(endpoint.host, host);
    assert_eq!(endpoint.prefix, prefix);
}

#[yare::parameterized(
    https    = { "https://jenkins" },
    no_host  = { "http:///path" },
    bare     = { "jenkins:8080" },
)]
fn endpoint_rejects(url: &str) {
    assert!(Endpoint::parse(url).is_err());
}

#[test]
fn form_encoding_escapes_reserved() {
    assert_eq!(
        form_encode([("script", "println 'a&b=c'"), ("hash", "q+/=")]),
        "script=println%20%27a%26b%3Dc%27&hash=q%2B%2F%3D"
    );
}

#[test]
fn request_carries_auth_and_length() {
    let endpoint = Endpoint::parse("http://jenkins:8080/ci").unwrap();
    let request = format_request(
        "POST",
        &endpoint,
        "/scriptText",
        "Basic dTpw",
        Some(("application/x-www-form-urlencoded", "script=x")),
    );
    assert!(request.starts_with("POST /ci/scriptText HTTP/1.1\r\n"));
    assert!(request.contains("Host: jenkins:8080\r\n"));
    assert!(request.contains("Authorization: Basic dTpw\r\n"));
    assert!(request.contains("Connection: close\r\n"));
    assert!(request.ends_with("Content-Length: 8\r\n\r\nscript=x"));
}
