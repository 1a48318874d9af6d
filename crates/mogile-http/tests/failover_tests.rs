mod common;

use std::time::Duration;

use common::{TestServer, dead_url};
use mogile_http::{Error, FailoverReader, HttpTransfer, TransferError, TransferOptions};

fn impatient_reader() -> FailoverReader {
    let options = TransferOptions::default().read_timeout(Some(Duration::from_millis(200)));
    FailoverReader::new(HttpTransfer::new(options))
}

#[tokio::test]
async fn first_healthy_replica_wins() {
    let first = TestServer::ok(b"data!").await;
    let second = TestServer::ok(b"other").await;
    let locations = [first.url("/dev1/0/000/000/0000000062.fid"), second.url("/dev2/0/000/000/0000000062.fid")];

    let body = FailoverReader::default().read("key", &locations).await.unwrap();
    assert_eq!(&body.bytes().await.unwrap()[..], b"data!");
    assert_eq!(first.accepted(), 1);
    assert_eq!(second.accepted(), 0);
}

#[tokio::test]
async fn not_found_fails_over_to_next_replica() {
    let first = TestServer::reply("HTTP/1.0 404 Not Found\r\n\r\ndata!").await;
    let second = TestServer::ok(b"data!").await;
    let locations = [first.url("/dev1/0/000/000/0000000062.fid"), second.url("/dev2/0/000/000/0000000062.fid")];

    let body = FailoverReader::default().read("key", &locations).await.unwrap();
    assert_eq!(&body.bytes().await.unwrap()[..], b"data!");
    assert_eq!(first.accepted(), 1);
    assert_eq!(second.accepted(), 1);
    assert_eq!(first.request_text(), "GET /dev1/0/000/000/0000000062.fid HTTP/1.0\r\n\r\n");
    assert_eq!(second.request_text(), "GET /dev2/0/000/000/0000000062.fid HTTP/1.0\r\n\r\n");
}

#[tokio::test]
async fn dead_and_malformed_replicas_are_skipped() {
    let dead = dead_url("/dev1/1.fid").await;
    let garbled = TestServer::reply("garbage\r\n\r\n").await;
    let hangup = TestServer::hangup().await;
    let good = TestServer::ok(b"payload").await;
    let locations = vec![
        dead,
        "/var/mogdata/dev3/1.fid".to_string(),
        garbled.url("/dev4/1.fid"),
        hangup.url("/dev5/1.fid"),
        good.url("/dev6/1.fid"),
    ];

    let body = FailoverReader::default().read("key", &locations).await.unwrap();
    assert_eq!(&body.bytes().await.unwrap()[..], b"payload");
}

#[tokio::test]
async fn exhausted_replicas_report_every_failure() {
    let first = TestServer::status("500 Internal Server Error").await;
    let second = TestServer::status("404 Not Found").await;
    let locations = [first.url("/a"), second.url("/b")];

    let err = FailoverReader::default().read("key", &locations).await.unwrap_err();
    match err {
        Error::UnreachableData { key, failures } => {
            assert_eq!(key, "key");
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].url, locations[0]);
            assert!(matches!(
                failures[0].error,
                TransferError::UnexpectedStatus { status: 500, .. }
            ));
            assert!(matches!(
                failures[1].error,
                TransferError::UnexpectedStatus { status: 404, .. }
            ));
        }
        other => panic!("expected UnreachableData, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_replica_list_is_unreachable() {
    let locations: [&str; 0] = [];
    let err = FailoverReader::default().read("key", &locations).await.unwrap_err();
    assert!(matches!(err, Error::UnreachableData { ref failures, .. } if failures.is_empty()));
}

#[tokio::test]
async fn size_uses_first_usable_head() {
    let missing = TestServer::reply("HTTP/1.0 404 Not Found\r\nContent-Length: 5\r\n\r\n").await;
    let no_length = TestServer::status("200 OK").await;
    let good = TestServer::reply("HTTP/1.0 200 OK\r\nContent-Length: 5\r\n\r\n").await;
    let locations = [missing.url("/path"), no_length.url("/path"), good.url("/path")];

    assert_eq!(FailoverReader::default().size("key", &locations).await, Some(5));
    assert_eq!(good.request_text(), "HEAD /path HTTP/1.0\r\n\r\n");
}

#[tokio::test]
async fn size_is_none_when_no_replica_answers() {
    let missing = TestServer::reply("HTTP/1.0 404 Not Found\r\nContent-Length: 5\r\n\r\n").await;
    let locations = [missing.url("/path"), dead_url("/path").await];

    assert_eq!(FailoverReader::default().size("key", &locations).await, None);
    assert_eq!(missing.accepted(), 1);
}

#[tokio::test]
async fn stalled_replica_times_out_and_fails_over() {
    let silent = TestServer::silent().await;
    let good = TestServer::ok(b"payload").await;
    let locations = [silent.url("/dev1/1.fid"), good.url("/dev2/1.fid")];

    let body = impatient_reader().read("key", &locations).await.unwrap();
    assert_eq!(&body.bytes().await.unwrap()[..], b"payload");
    assert_eq!(silent.accepted(), 1);
    assert_eq!(good.accepted(), 1);
}

#[tokio::test]
async fn read_all_skips_replica_that_truncates_body() {
    let short = TestServer::reply("HTTP/1.0 200 OK\r\nContent-Length: 10\r\n\r\nabc").await;
    let good = TestServer::ok(b"0123456789").await;
    let locations = [short.url("/dev1/1.fid"), good.url("/dev2/1.fid")];

    let data = FailoverReader::default().read_all("key", &locations).await.unwrap();
    assert_eq!(&data[..], b"0123456789");
    assert_eq!(short.accepted(), 1);
    assert_eq!(good.accepted(), 1);
}

#[tokio::test]
async fn read_all_reports_mid_body_failures() {
    let short = TestServer::reply("HTTP/1.0 200 OK\r\nContent-Length: 10\r\n\r\nabc").await;
    let missing = TestServer::status("404 Not Found").await;
    let locations = [short.url("/a"), missing.url("/b")];

    match FailoverReader::default().read_all("key", &locations).await {
        Err(Error::UnreachableData { failures, .. }) => {
            assert_eq!(failures.len(), 2);
            assert!(matches!(
                failures[0].error,
                TransferError::TruncatedBody { expected: 10, received: 3 }
            ));
            assert!(matches!(
                failures[1].error,
                TransferError::UnexpectedStatus { status: 404, .. }
            ));
        }
        other => panic!("expected UnreachableData, got {other:?}"),
    }
}
