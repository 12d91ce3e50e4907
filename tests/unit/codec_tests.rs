//! Unit tests for request/response line framing.

use std::io::Cursor;

use mediafileinfo_client::protocol::codec::{read_response, write_request, MAX_LINE_BYTES};
use mediafileinfo_client::AppError;

#[test]
fn request_is_filename_plus_newline() {
    let mut out = Vec::new();
    write_request(&mut out, b"a.mp4").expect("write must succeed");
    assert_eq!(out, b"a.mp4\n");
}

#[test]
fn request_bytes_are_sent_unmodified() {
    let mut out = Vec::new();
    let name: &[u8] = b"a=b c\xff\x00.mp4";
    write_request(&mut out, name).expect("write must succeed");
    assert_eq!(&out[..name.len()], name);
    assert_eq!(out.last(), Some(&b'\n'));
}

#[test]
fn filename_with_newline_is_refused_before_writing() {
    let mut out = Vec::new();
    let result = write_request(&mut out, b"a\nb.mp4");
    assert!(matches!(result, Err(AppError::InvalidFilename(_))));
    assert!(out.is_empty(), "nothing must be written for a refused filename");
}

#[test]
fn complete_line_is_returned_with_newline() {
    let mut input = Cursor::new(b"format=mp4 f=a.mp4\n".to_vec());
    let line = read_response(&mut input, MAX_LINE_BYTES).expect("read must succeed");
    assert_eq!(line.as_deref(), Some(&b"format=mp4 f=a.mp4\n"[..]));
}

#[test]
fn batched_lines_are_read_one_at_a_time() {
    let mut input = Cursor::new(b"format=mp4 f=a.mp4\nformat=text f=b.txt\n".to_vec());

    let first = read_response(&mut input, MAX_LINE_BYTES).expect("first read");
    assert_eq!(first.as_deref(), Some(&b"format=mp4 f=a.mp4\n"[..]));

    let second = read_response(&mut input, MAX_LINE_BYTES).expect("second read");
    assert_eq!(second.as_deref(), Some(&b"format=text f=b.txt\n"[..]));

    let third = read_response(&mut input, MAX_LINE_BYTES).expect("third read");
    assert!(third.is_none(), "stream is exhausted");
}

#[test]
fn empty_stream_yields_none() {
    let mut input = Cursor::new(Vec::new());
    let line = read_response(&mut input, MAX_LINE_BYTES).expect("read must succeed");
    assert!(line.is_none());
}

#[test]
fn partial_line_at_eof_yields_none() {
    let mut input = Cursor::new(b"format=mp4 f=a.m".to_vec());
    let line = read_response(&mut input, MAX_LINE_BYTES).expect("read must succeed");
    assert!(line.is_none(), "an unterminated line is not a response");
}

#[test]
fn line_at_limit_is_accepted() {
    let mut raw = vec![b'x'; 16];
    raw.push(b'\n');
    let mut input = Cursor::new(raw.clone());
    let line = read_response(&mut input, 16).expect("line at the limit must be accepted");
    assert_eq!(line, Some(raw));
}

#[test]
fn line_over_limit_is_rejected() {
    let mut raw = vec![b'x'; 17];
    raw.push(b'\n');
    let mut input = Cursor::new(raw);
    let result = read_response(&mut input, 16);
    match result {
        Err(AppError::LineTooLong(max)) => assert_eq!(max, 16),
        other => panic!("expected LineTooLong, got: {other:?}"),
    }
}
