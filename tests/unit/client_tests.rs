//! Unit tests for `ProtocolClient` over in-memory streams.

use std::io::Cursor;

use mediafileinfo_client::{AppError, ProtocolClient};

fn responses(lines: &str) -> Cursor<Vec<u8>> {
    Cursor::new(lines.as_bytes().to_vec())
}

#[test]
fn sequential_queries_return_records_in_order() {
    let mut sent = Vec::new();
    {
        let mut client = ProtocolClient::new(
            responses("format=mp4 width=100 height=50 f=a.mp4\nformat=text f=b.txt\n"),
            &mut sent,
        );

        let first = client.query("a.mp4").expect("first query");
        assert_eq!(first.format(), "mp4");
        assert_eq!(first.get("width"), Some("100"));
        assert_eq!(first.get("height"), Some("50"));
        assert_eq!(first.get("f"), Some("a.mp4"));
        assert_eq!(first.len(), 4);

        let second = client.query("b.txt").expect("second query");
        assert_eq!(second.format(), "text");
        assert_eq!(second.get("f"), Some("b.txt"));
        assert_eq!(second.len(), 2);
    }
    assert_eq!(sent, b"a.mp4\nb.txt\n");
}

#[test]
fn round_trip_keeps_filename_exactly() {
    let name = "dir/with space/a=b c.mp4";
    let mut sent = Vec::new();
    let mut client = ProtocolClient::new(
        responses("format=mp4 f=dir/with space/a=b c.mp4\n"),
        &mut sent,
    );

    let record = client.query(name).expect("query");
    assert_eq!(record.get("f"), Some(name));
}

#[test]
fn end_of_stream_is_connection_closed_and_sticky() {
    let mut sent = Vec::new();
    {
        let mut client = ProtocolClient::new(responses(""), &mut sent);

        let first = client.query("a.mp4").expect_err("no response available");
        assert!(matches!(first, AppError::ConnectionClosed));
        assert!(client.is_closed());

        let second = client.query("b.mp4").expect_err("connection is dead");
        assert!(matches!(second, AppError::ConnectionClosed));
    }
    assert_eq!(sent, b"a.mp4\n", "no request is written after the connection died");
}

#[test]
fn protocol_errors_do_not_close_the_connection() {
    let mut sent = Vec::new();
    let mut client = ProtocolClient::new(
        responses("format=mp4 f=y.mp4\nformat=mp4 f=z.mp4\n"),
        &mut sent,
    );

    let err = client.query("x.mp4").expect_err("suffix mismatch");
    assert!(matches!(err, AppError::BadSuffix { .. }));
    assert!(!client.is_closed());

    let record = client.query("z.mp4").expect("next query still works");
    assert_eq!(record.get("f"), Some("z.mp4"));
}

#[test]
fn bad_prefix_carries_raw_response() {
    let mut sent = Vec::new();
    let mut client = ProtocolClient::new(responses("oops f=x.mp4\n"), &mut sent);

    let err = client.query("x.mp4").expect_err("bad prefix");
    assert!(matches!(err, AppError::BadPrefix { .. }));
    assert_eq!(err.raw_response(), Some(&b"oops f=x.mp4\n"[..]));
}

#[test]
fn newline_in_filename_is_refused_without_io() {
    let mut sent = Vec::new();
    {
        let mut client = ProtocolClient::new(responses("format=mp4 f=ok.mp4\n"), &mut sent);

        let err = client.query("bad\nname").expect_err("newline refused");
        assert!(matches!(err, AppError::InvalidFilename(_)));
        assert!(!client.is_closed());

        client.query("ok.mp4").expect("client still usable");
    }
    assert_eq!(sent, b"ok.mp4\n");
}

#[test]
fn oversized_response_closes_the_connection() {
    let mut sent = Vec::new();
    let mut client =
        ProtocolClient::new(responses("format=mp4 f=a.mp4\n"), &mut sent).with_max_line_bytes(8);

    let err = client.query("a.mp4").expect_err("line too long");
    assert!(matches!(err, AppError::LineTooLong(8)));
    assert!(client.is_closed());
}

#[test]
fn close_rejects_further_queries() {
    let mut sent = Vec::new();
    let mut client = ProtocolClient::new(responses("format=mp4 f=a.mp4\n"), &mut sent);

    client.close().expect("close");
    client.close().expect("second close is a no-op");
    assert!(client.is_closed());

    let err = client.query("a.mp4").expect_err("closed");
    assert!(matches!(err, AppError::ConnectionClosed));
}
