/// Integration tests for verified downloads over the built-in HTTP client
///
/// A loopback server stands in for the package mirror.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tiny_http::{Response, Server};
use wpup_pm::http::{HttpClient, HttpClientConfig};
use wpup_pm::{package_dir, DownloadTarget, Fetcher, HttpTransport, SelectionSet, Transport, UpdaterError};

struct Mirror {
    base: String,
    requests: Arc<AtomicUsize>,
}

/// Serve fixed bodies by path; anything else is a 404
fn start_mirror(files: &[(&str, Vec<u8>)]) -> Mirror {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let files: HashMap<String, Vec<u8>> = files
        .iter()
        .map(|(path, body)| (path.to_string(), body.clone()))
        .collect();
    let requests = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&requests);

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = match files.get(request.url()) {
                Some(body) => request.respond(Response::from_data(body.clone())),
                None => request.respond(Response::from_string("missing").with_status_code(404)),
            };
        }
    });

    Mirror {
        base: format!("http://{}", addr),
        requests,
    }
}

fn client() -> HttpClient {
    HttpClient::with_config(
        HttpClientConfig::new()
            .with_max_retries(0)
            .with_timeout(Duration::from_secs(10)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_expected_len_from_content_length() {
    let mirror = start_mirror(&[("/pkgs/foo.cab", vec![7u8; 1234])]);
    let dir = TempDir::new().unwrap();
    let target = DownloadTarget::resolve(&format!("{}/pkgs/foo.cab", mirror.base), dir.path()).unwrap();

    let transport = HttpTransport::new(client());
    assert_eq!(transport.expected_len(&target).await.unwrap(), 1234);
}

#[tokio::test]
async fn test_missing_package_is_an_http_error() {
    let mirror = start_mirror(&[]);
    let dir = TempDir::new().unwrap();
    let target = DownloadTarget::resolve(&format!("{}/pkgs/gone.cab", mirror.base), dir.path()).unwrap();

    let err = HttpTransport::new(client()).expected_len(&target).await.unwrap_err();
    assert!(matches!(err, UpdaterError::Http(_)));
}

#[tokio::test]
async fn test_fetch_selection_into_package_dir() {
    let mirror = start_mirror(&[
        ("/15063/foo.cab", vec![1u8; 4096]),
        ("/15063/bar.spkg", vec![2u8; 100]),
    ]);
    let root = TempDir::new().unwrap();
    let dest = package_dir(root.path(), "0123456789");

    let selection: SelectionSet = [
        format!("{}/15063/foo.cab", mirror.base),
        String::new(),
        format!("{}/15063/bar.spkg", mirror.base),
    ]
    .into_iter()
    .collect();
    let targets = DownloadTarget::from_selection(&selection, &dest).unwrap();
    assert_eq!(targets.len(), 2);

    let fetcher = Fetcher::new(HttpTransport::new(client())).with_retry_delay(Duration::ZERO);
    let fetched = fetcher.fetch(&targets, &()).await.unwrap();

    assert_eq!(fetched.iter().map(|f| f.attempts).collect::<Vec<_>>(), vec![1, 1]);
    assert_eq!(std::fs::read(dest.join("foo.cab")).unwrap(), vec![1u8; 4096]);
    assert_eq!(std::fs::metadata(dest.join("bar.spkg")).unwrap().len(), 100);

    // One size probe and one transfer per package
    assert_eq!(mirror.requests.load(Ordering::SeqCst), 4);

    let last = fetcher.last_progress().unwrap();
    assert_eq!((last.received, last.total), (100, 100));
    assert_eq!(last.percent(), 100);
}

#[tokio::test]
async fn test_stale_partial_file_is_replaced() {
    let mirror = start_mirror(&[("/pkgs/foo.cab", vec![9u8; 64])]);
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("foo.cab"), b"partial").unwrap();

    let target = DownloadTarget::resolve(&format!("{}/pkgs/foo.cab", mirror.base), dir.path()).unwrap();
    let fetched = Fetcher::new(HttpTransport::new(client()))
        .with_retry_delay(Duration::ZERO)
        .fetch(&[target], &())
        .await
        .unwrap();

    assert_eq!(fetched[0].expected_len, 64);
    assert_eq!(std::fs::read(dir.path().join("foo.cab")).unwrap(), vec![9u8; 64]);
}
