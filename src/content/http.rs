//! Fetches raw page text from wiki style HTTP endpoints.

use crate::config::WordNamesSettings;
use crate::content::{DeploymentTarget, PageContentFetcher};
use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;

/// Reads pages via `<endpoint>?title=<page>&action=raw`.
///
/// Each deployment identity is mapped to the URL of its script endpoint,
/// e.g. `https://meta.example.org/w/index.php`.
pub struct HttpPageFetcher {
    client: Client,
    local_endpoint: String,
    endpoints: HashMap<String, String>,
}

impl HttpPageFetcher {
    pub fn new(local_endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            local_endpoint: local_endpoint.into(),
            endpoints: HashMap::new(),
        }
    }

    /// Registers the endpoint of another deployment.
    pub fn with_endpoint(mut self, identity: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.endpoints.insert(identity.into(), endpoint.into());
        self
    }

    /// Registers `endpoint` for the central deployment named in `settings`.
    ///
    /// Fails if the central deployment differs from `local_identity` but no
    /// endpoint is given, as its pages could never be read. An endpoint
    /// without a central deployment is rejected as well.
    pub fn with_central_endpoint(
        self,
        settings: &WordNamesSettings,
        local_identity: &str,
        endpoint: Option<&str>,
    ) -> anyhow::Result<Self> {
        match (settings.central_deployment.as_deref(), endpoint) {
            (Some(deployment), Some(endpoint)) => Ok(self.with_endpoint(deployment, endpoint)),
            (None, Some(endpoint)) => {
                bail!("Central endpoint {} given, but no central deployment is configured", endpoint)
            }
            (Some(deployment), None) if deployment != local_identity => {
                bail!("No endpoint configured for central deployment '{}'", deployment)
            }
            _ => Ok(self),
        }
    }

    fn endpoint(&self, target: &DeploymentTarget) -> anyhow::Result<&str> {
        match target {
            DeploymentTarget::Local => Ok(&self.local_endpoint),
            DeploymentTarget::Named(identity) => self
                .endpoints
                .get(identity)
                .map(String::as_str)
                .with_context(|| format!("No endpoint known for deployment '{}'", identity)),
        }
    }
}

#[async_trait]
impl PageContentFetcher for HttpPageFetcher {
    #[tracing::instrument(level = "debug", skip(self), err(Display))]
    async fn fetch_main_content(
        &self,
        target: &DeploymentTarget,
        page_name: &str,
    ) -> anyhow::Result<Option<String>> {
        let endpoint = self.endpoint(target)?;
        let response = self
            .client
            .get(endpoint)
            .query(&[("title", page_name), ("action", "raw")])
            .send()
            .await
            .with_context(|| format!("Failed to fetch '{}' from {}", page_name, endpoint))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(
                response
                    .text()
                    .await
                    .with_context(|| format!("Failed to read '{}' from {}", page_name, endpoint))?,
            )),
            status => bail!("Fetching '{}' from {} failed: {}", page_name, endpoint, status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemorySharedCache;
    use crate::wordlist::WordListResolver;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const PAGE: &str = "Temp user words";

    /// A wiki endpoint answering every request with the same response.
    struct WikiServer {
        endpoint: String,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl WikiServer {
        async fn start(status: &'static str, body: &'static str) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let endpoint = format!("http://{}/w/index.php", listener.local_addr().unwrap());
            let requests = Arc::new(Mutex::new(Vec::new()));

            let seen = requests.clone();
            tokio::spawn(async move {
                while let Ok((mut stream, _)) = listener.accept().await {
                    let mut request: Vec<u8> = Vec::new();
                    let mut buffer = [0u8; 1024];
                    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                        match stream.read(&mut buffer).await {
                            Ok(0) | Err(_) => break,
                            Ok(read) => request.extend_from_slice(&buffer[..read]),
                        }
                    }
                    let request_line = String::from_utf8_lossy(&request)
                        .lines()
                        .next()
                        .unwrap_or_default()
                        .to_string();
                    seen.lock().unwrap().push(request_line);

                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                }
            });

            Self { endpoint, requests }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    fn direct(fetcher: HttpPageFetcher) -> HttpPageFetcher {
        HttpPageFetcher {
            client: Client::builder().no_proxy().build().unwrap(),
            ..fetcher
        }
    }

    #[test]
    fn endpoint_selects_by_deployment() {
        let fetcher = HttpPageFetcher::new("https://local.example.org/w/index.php")
            .with_endpoint("metawiki", "https://meta.example.org/w/index.php");

        assert_eq!(
            fetcher.endpoint(&DeploymentTarget::Local).unwrap(),
            "https://local.example.org/w/index.php"
        );
        assert_eq!(
            fetcher
                .endpoint(&DeploymentTarget::Named("metawiki".to_string()))
                .unwrap(),
            "https://meta.example.org/w/index.php"
        );
        assert!(
            fetcher
                .endpoint(&DeploymentTarget::Named("other".to_string()))
                .is_err()
        );
    }

    #[test]
    fn central_endpoint_is_registered_for_central_deployment() {
        let settings = WordNamesSettings {
            central_deployment: Some("metawiki".to_string()),
            ..WordNamesSettings::with_page(PAGE)
        };

        let fetcher = HttpPageFetcher::new("https://local.example.org/w/index.php")
            .with_central_endpoint(&settings, "enwiki", Some("https://meta.example.org/w/index.php"))
            .unwrap();

        assert_eq!(
            fetcher
                .endpoint(&DeploymentTarget::Named("metawiki".to_string()))
                .unwrap(),
            "https://meta.example.org/w/index.php"
        );
    }

    #[test]
    fn central_endpoint_must_match_settings() {
        let central = WordNamesSettings {
            central_deployment: Some("metawiki".to_string()),
            ..WordNamesSettings::with_page(PAGE)
        };
        let local_only = WordNamesSettings::with_page(PAGE);
        let local = || HttpPageFetcher::new("https://local.example.org/w/index.php");

        assert!(local().with_central_endpoint(&central, "enwiki", None).is_err());
        assert!(local().with_central_endpoint(&central, "metawiki", None).is_ok());
        assert!(local().with_central_endpoint(&local_only, "enwiki", None).is_ok());
        assert!(
            local()
                .with_central_endpoint(&local_only, "enwiki", Some("https://meta.example.org"))
                .is_err()
        );
    }

    #[tokio::test]
    async fn successful_response_yields_page_text() {
        let server = WikiServer::start("200 OK", "apple\nbanana\n").await;
        let fetcher = direct(HttpPageFetcher::new(server.endpoint.clone()));

        let content = fetcher
            .fetch_main_content(&DeploymentTarget::Local, PAGE)
            .await
            .unwrap();

        assert_eq!(content.as_deref(), Some("apple\nbanana\n"));
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("GET /w/index.php?"), "{}", requests[0]);
        assert!(requests[0].contains("title=Temp+user+words"), "{}", requests[0]);
        assert!(requests[0].contains("action=raw"), "{}", requests[0]);
    }

    #[tokio::test]
    async fn not_found_yields_no_content() {
        let server = WikiServer::start("404 Not Found", "").await;
        let fetcher = direct(HttpPageFetcher::new(server.endpoint.clone()));

        let content = fetcher
            .fetch_main_content(&DeploymentTarget::Local, PAGE)
            .await
            .unwrap();

        assert_eq!(content, None);
    }

    #[tokio::test]
    async fn server_error_is_an_error() {
        let server = WikiServer::start("500 Internal Server Error", "oops").await;
        let fetcher = direct(HttpPageFetcher::new(server.endpoint.clone()));

        let result = fetcher
            .fetch_main_content(&DeploymentTarget::Local, PAGE)
            .await;

        assert!(format!("{:#}", result.unwrap_err()).contains("500"));
    }

    #[tokio::test]
    async fn central_page_is_read_from_central_endpoint() {
        let central = WikiServer::start("200 OK", "apple\nbanana\ncherry\n").await;
        let settings = WordNamesSettings {
            num_words: 2,
            central_deployment: Some("metawiki".to_string()),
            ..WordNamesSettings::with_page(PAGE)
        };
        let fetcher = HttpPageFetcher::new("http://127.0.0.1:9/w/index.php")
            .with_central_endpoint(&settings, "enwiki", Some(central.endpoint.as_str()))
            .unwrap();

        let resolver = WordListResolver::with_local_identity(
            &settings,
            "enwiki",
            Arc::new(direct(fetcher)),
            Arc::new(InMemorySharedCache::new()),
        )
        .unwrap();
        let words = resolver.resolve().await;

        assert!(!words.is_fallback());
        assert_eq!(words.words(), ["apple", "banana", "cherry"]);
        assert_eq!(central.requests().len(), 1);
    }
}
