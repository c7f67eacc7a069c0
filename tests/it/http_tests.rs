use lszip::app::{RunOptions, run};
use lszip::{Error, HttpOptions, HttpRangeFetcher, RangeFetcher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use crate::test_support::{ZipBuilder, sample_archive};

/// Serves `bytes=start-end` slices of an in-memory file as `206`.
struct RangeResponder {
    data: Vec<u8>,
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let range = request
            .headers
            .get("range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("bytes="))
            .and_then(|v| v.split_once('-'));
        let Some((start, end)) = range else {
            return ResponseTemplate::new(200).set_body_bytes(self.data.clone());
        };

        let len = self.data.len();
        let start: usize = start.parse().unwrap();
        let end: usize = end.parse::<usize>().unwrap().min(len - 1);
        ResponseTemplate::new(206)
            .insert_header("Content-Range", format!("bytes {start}-{end}/{len}").as_str())
            .set_body_bytes(self.data[start..=end].to_vec())
    }
}

/// Answers every range with the first byte only.
struct StuckResponder {
    len: usize,
}

impl Respond for StuckResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(206)
            .insert_header("Content-Range", format!("bytes 0-0/{}", self.len).as_str())
            .set_body_bytes(vec![b'P'])
    }
}

async fn serve(data: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/archive.zip"))
        .respond_with(RangeResponder { data })
        .mount(&server)
        .await;
    server
}

async fn connect(server: &MockServer) -> lszip::Result<HttpRangeFetcher> {
    let url = format!("{}/archive.zip", server.uri());
    HttpRangeFetcher::connect(&url, &HttpOptions::default()).await
}

#[tokio::test]
async fn length_from_range_probe_when_head_is_refused() {
    let archive = sample_archive();
    let server = serve(archive.clone()).await;

    let fetcher = connect(&server).await.unwrap();

    assert_eq!(fetcher.size(), archive.len() as u64);
    assert_eq!(fetcher.fetch(0, 3).await.unwrap(), b"PK\x03\x04");
    assert_eq!(fetcher.transferred_bytes(), 4);
}

#[tokio::test]
async fn lists_and_extracts_over_http() {
    let big = vec![0x5a; 256 * 1024];
    let archive = ZipBuilder::new()
        .stored("blob.bin", &big)
        .dir("docs/")
        .deflated("docs/readme.txt", b"read me first")
        .finish();
    let server = serve(archive.clone()).await;
    let fetcher = Arc::new(connect(&server).await.unwrap());

    let dir = tempfile::tempdir().unwrap();
    let options = RunOptions {
        download: vec![1],
        output_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let mut out = Vec::new();
    let summary = run(fetcher.clone(), &options, &mut out).await.unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "0 : blob.bin\n1 : docs/\n2 : docs/readme.txt\n"
    );
    assert_eq!((summary.files, summary.directories), (1, 1));
    assert_eq!(
        std::fs::read(dir.path().join("docs/readme.txt")).unwrap(),
        b"read me first"
    );
    assert!(!dir.path().join("blob.bin").exists());
    // Only the tail, the central directory and one entry crossed the wire
    assert!(fetcher.transferred_bytes() < archive.len() as u64 / 100);
}

#[tokio::test]
async fn full_body_means_ranges_unsupported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_archive()))
        .mount(&server)
        .await;

    let Err(err) = connect(&server).await else {
        panic!("a 200 answer to a range request must fail");
    };
    assert!(matches!(err, Error::RangeUnsupported(status) if status == 200));
}

#[tokio::test]
async fn accept_ranges_none_fails_early() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("Accept-Ranges", "none"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(RangeResponder {
            data: sample_archive(),
        })
        .expect(0)
        .mount(&server)
        .await;

    let Err(err) = connect(&server).await else {
        panic!("Accept-Ranges: none must fail");
    };
    assert!(matches!(err, Error::RangeUnsupported(_)));
}

#[tokio::test]
async fn missing_resource() {
    let server = MockServer::start().await;

    let Err(err) = connect(&server).await else {
        panic!("nothing is mounted");
    };
    assert!(matches!(err, Error::HttpStatus(status) if status == 404));
}

#[tokio::test]
async fn range_mismatch_is_reported() {
    let archive = sample_archive();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(StuckResponder { len: archive.len() })
        .mount(&server)
        .await;

    let fetcher = connect(&server).await.unwrap();
    let err = fetcher.fetch(10, 20).await.unwrap_err();

    match err {
        Error::RangeMismatch { expected, actual } => {
            assert_eq!(expected, "bytes 10-20");
            assert_eq!(actual, format!("bytes 0-0/{}", archive.len()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn out_of_bounds_range_is_not_sent() {
    let archive = sample_archive();
    let len = archive.len() as u64;
    let server = serve(archive).await;
    let fetcher = connect(&server).await.unwrap();

    let err = fetcher.fetch(len - 2, len).await.unwrap_err();

    assert!(matches!(err, Error::InvalidRange { .. }));
    assert_eq!(fetcher.transferred_bytes(), 0);
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let Err(err) =
        HttpRangeFetcher::connect("http://127.0.0.1:1/archive.zip", &HttpOptions::default()).await
    else {
        panic!("nothing listens on port 1");
    };
    assert!(matches!(err, Error::Transport(_)));
}

fn retrying(retries: u32) -> HttpOptions {
    HttpOptions {
        timeout: Duration::from_millis(100),
        retries,
        ..Default::default()
    }
}

#[tokio::test]
async fn timeouts_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let url = format!("{}/archive.zip", server.uri());
    let Err(err) = HttpRangeFetcher::connect(&url, &retrying(2)).await else {
        panic!("every request times out");
    };

    assert!(matches!(&err, Error::Transport(e) if e.is_timeout()), "{err}");
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);
}

#[tokio::test]
async fn refused_connection_is_retried_with_backoff() {
    let started = Instant::now();
    let Err(err) =
        HttpRangeFetcher::connect("http://127.0.0.1:1/archive.zip", &retrying(1)).await
    else {
        panic!("nothing listens on port 1");
    };

    assert!(matches!(&err, Error::Transport(e) if e.is_connect()), "{err}");
    assert!(started.elapsed() >= Duration::from_millis(500));
}

#[tokio::test]
async fn error_statuses_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/archive.zip", server.uri());
    let Err(err) = HttpRangeFetcher::connect(&url, &retrying(3)).await else {
        panic!("the server is unavailable");
    };

    assert!(matches!(err, Error::HttpStatus(status) if status == 503));
    // One HEAD answered 404, one range probe answered 503
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
}
