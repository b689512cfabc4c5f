//! A tiny stub HTTP server, built on `wiremock`, preconfigured for the
//! scenarios the download manager's integration tests exercise: a plain
//! download, byte-range resume, and redirect chains.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start a stub server that serves `body` in full for `GET {route}`,
/// advertising byte-range support via `Accept-Ranges`.
pub async fn serve_full_body(route: &str, body: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;
    let len = body.len();
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("accept-ranges", "bytes")
                .insert_header("content-length", len.to_string())
                .set_body_bytes(body),
        )
        .mount(&server)
        .await;
    server
}

/// Start a stub server that, for `GET {route}` with a `Range:
/// bytes=<offset>-` header, serves only the suffix of `body` starting at
/// `offset`, with a `206 Partial Content` response.
pub async fn serve_range_resume(route: &str, body: Vec<u8>, offset: usize) -> MockServer {
    let server = MockServer::start().await;
    let total = body.len();
    let suffix = body[offset..].to_vec();
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("range", format!("bytes={offset}-").as_str()))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header(
                    "content-range",
                    format!("bytes {offset}-{}/{total}", total.saturating_sub(1)),
                )
                .set_body_bytes(suffix),
        )
        .mount(&server)
        .await;
    server
}

/// Start a stub server whose `GET {route}` fails `flaky_failures` times
/// with a `503`, then serves `body` successfully. Useful for exercising
/// the download manager's retry-on-transient-error path.
pub async fn serve_flaky(route: &str, body: Vec<u8>, flaky_failures: usize) -> MockServer {
    let server = MockServer::start().await;
    for _ in 0..flaky_failures {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;
    server
}

/// Start a stub server that redirects `GET {from}` to `{to}` with a `302`.
pub async fn serve_redirect(from: &str, to: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(302).insert_header("location", to))
        .mount(&server)
        .await;
    server
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn servers_start_and_expose_a_uri() {
        let full = serve_full_body("/model.bin", b"hello world".to_vec()).await;
        assert!(full.uri().starts_with("http://"));

        let resume = serve_range_resume("/model.bin", b"hello world".to_vec(), 5).await;
        assert!(resume.uri().starts_with("http://"));

        let flaky = serve_flaky("/model.bin", b"hello world".to_vec(), 2).await;
        assert!(flaky.uri().starts_with("http://"));

        let redirect = serve_redirect("/old", "/new").await;
        assert!(redirect.uri().starts_with("http://"));
    }
}
