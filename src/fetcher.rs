use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::redirect;

use crate::error::FetchError;
use crate::models::{ApiStatus, ReviewPage};

pub const DEFAULT_BASE_URL: &str = "https://store.steampowered.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const FIXED_PARAMS: [(&str, &str); 6] = [
    ("filter", "recent"),
    ("language", "all"),
    ("purchase_type", "all"),
    ("num_per_page", "100"),
    ("filter_offtopic_activity", "0"),
    ("json", "1"),
];

/// Something that can return one page of reviews for a cursor.
pub trait ReviewSource {
    fn fetch_page(&mut self, cursor: &str) -> Result<ReviewPage, FetchError>;
}

/// Build the `appreviews` URL. The cursor is only appended when non-empty.
pub fn review_url(base_url: &str, app_id: u32, cursor: &str) -> Result<Url> {
    let base = format!("{}/appreviews/{}", base_url.trim_end_matches('/'), app_id);
    let url = Url::parse_with_params(&base, FIXED_PARAMS)
        .with_context(|| format!("Invalid review endpoint: {base}"))?;
    Ok(with_cursor(url, cursor))
}

fn with_cursor(mut url: Url, cursor: &str) -> Url {
    if !cursor.is_empty() {
        url.query_pairs_mut().append_pair("cursor", cursor);
    }
    url
}

/// Blocking client for the Steam store review endpoint.
pub struct SteamFetcher {
    client: Client,
    endpoint: Url,
}

impl SteamFetcher {
    pub fn new(base_url: &str, app_id: u32) -> Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(10))
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: review_url(base_url, app_id, "")?,
        })
    }
}

impl ReviewSource for SteamFetcher {
    fn fetch_page(&mut self, cursor: &str) -> Result<ReviewPage, FetchError> {
        let url = with_cursor(self.endpoint.clone(), cursor);
        let body = self.client.get(url).send()?.error_for_status()?.text()?;

        let status: ApiStatus = serde_json::from_str(&body)?;
        if let Some(flag) = status.success.filter(|flag| *flag != 1) {
            return Err(FetchError::Unsuccessful(flag));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Answer exactly one request on a local port. Returns the base URL and
    /// a receiver for the request line that was received.
    fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let text = String::from_utf8_lossy(&request);
            let _ = tx.send(text.lines().next().unwrap_or_default().to_string());

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        });

        (base, rx)
    }

    #[test]
    fn ok_response_returns_page() {
        let (base, rx) = serve_once(
            "200 OK",
            r#"{"success":1,"reviews":[{"recommendationid":"7","review":"fine"}],"cursor":"next+1"}"#,
        );
        let mut fetcher = SteamFetcher::new(&base, 1658280).unwrap();

        let page = fetcher.fetch_page("abc+").unwrap();
        assert_eq!(page.cursor, "next+1");
        assert_eq!(page.reviews.len(), 1);

        let request_line = rx.recv().unwrap();
        assert!(request_line.starts_with("GET /appreviews/1658280?filter=recent"));
        assert!(request_line.contains("&cursor=abc%2B "));
    }

    #[test]
    fn non_2xx_is_status_error() {
        let (base, _rx) = serve_once("503 Service Unavailable", "busy");
        let mut fetcher = SteamFetcher::new(&base, 10).unwrap();

        let err = fetcher.fetch_page("").unwrap_err();
        assert!(matches!(err, FetchError::Status(503)), "got {err:?}");
    }

    #[test]
    fn unsuccessful_flag_is_reported() {
        let (base, _rx) = serve_once("200 OK", r#"{"success":2}"#);
        let mut fetcher = SteamFetcher::new(&base, 10).unwrap();

        let err = fetcher.fetch_page("").unwrap_err();
        assert!(matches!(err, FetchError::Unsuccessful(2)), "got {err:?}");
    }

    #[test]
    fn garbage_body_is_decode_error() {
        let (base, _rx) = serve_once("200 OK", "<html>not json</html>");
        let mut fetcher = SteamFetcher::new(&base, 10).unwrap();

        let err = fetcher.fetch_page("").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn page_without_cursor_is_decode_error() {
        let (base, _rx) = serve_once("200 OK", r#"{"success":1,"reviews":[]}"#);
        let mut fetcher = SteamFetcher::new(&base, 10).unwrap();

        let err = fetcher.fetch_page("c1").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let mut fetcher = SteamFetcher::new(&base, 10).unwrap();

        let err = fetcher.fetch_page("").unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)), "got {err:?}");
    }

    #[test]
    fn first_request_has_no_cursor() {
        let url = review_url(DEFAULT_BASE_URL, 1658280, "").unwrap();
        assert_eq!(
            url.as_str(),
            "https://store.steampowered.com/appreviews/1658280?filter=recent&language=all&purchase_type=all&num_per_page=100&filter_offtopic_activity=0&json=1"
        );
    }

    #[test]
    fn cursor_is_percent_encoded() {
        let url = review_url(DEFAULT_BASE_URL, 1658280, "AoJ4+/=").unwrap();
        assert!(url.as_str().ends_with("&json=1&cursor=AoJ4%2B%2F%3D"));
        let cursor = url
            .query_pairs()
            .find(|(k, _)| k == "cursor")
            .map(|(_, v)| v.into_owned());
        assert_eq!(cursor.as_deref(), Some("AoJ4+/="));
    }

    #[test]
    fn trailing_slash_in_base_is_ignored() {
        let url = review_url("http://localhost:8080/", 10, "").unwrap();
        assert!(url.as_str().starts_with("http://localhost:8080/appreviews/10?"));
    }

    #[test]
    fn bad_base_url_rejected() {
        assert!(review_url("not a url", 10, "").is_err());
        assert!(SteamFetcher::new("not a url", 10).is_err());
    }
}
