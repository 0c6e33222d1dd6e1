//! REST API client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::ApiConfig,
    error::{Error, Result},
    ratelimit::QuotaStatus,
    types::{Account, ApiResponse, IdPage, Status},
};

/// The REST transport seam.
///
/// Every call returns its payload together with the quota the service
/// reported for it; callers are expected to route responses through a
/// [`crate::RequestExecutor`] so exhausted quotas are absorbed as waits.
/// Calls are synchronous request/response; nothing here retries.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Search recent statuses.
    async fn search(&self, query: &str, count: u32) -> Result<ApiResponse<Vec<Status>>>;

    /// The authenticated account's home timeline.
    async fn home_timeline(&self, count: u32) -> Result<ApiResponse<Vec<Status>>>;

    /// Statuses mentioning the authenticated account.
    async fn mentions_timeline(&self, count: u32) -> Result<ApiResponse<Vec<Status>>>;

    /// Post a status, optionally as a reply.
    async fn update_status(
        &self,
        text: &str,
        in_reply_to_status_id: Option<u64>,
    ) -> Result<ApiResponse<Status>>;

    /// IDs of accounts following the given account.
    async fn follower_ids(&self, screen_name: &str) -> Result<ApiResponse<IdPage>>;

    /// IDs of accounts the given account follows.
    async fn friend_ids(&self, screen_name: &str) -> Result<ApiResponse<IdPage>>;

    /// Fetch one account snapshot by ID.
    async fn show_user(&self, id: u64) -> Result<ApiResponse<Account>>;

    /// Retweet a status by ID.
    async fn retweet(&self, status_id: u64) -> Result<ApiResponse<Status>>;
}

/// REST client over reqwest with bearer-token auth.
#[derive(Debug)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

/// Wire shape of the search endpoint.
#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    statuses: Vec<Status>,
}

/// Wire shape of an error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    message: String,
}

impl HttpApiClient {
    /// Create a client from configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        if config.bearer_token.is_empty() {
            return Err(Error::Config("bearer token required".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("aviary/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<ApiResponse<T>> {
        debug!(endpoint, "GET");
        let response = self
            .client
            .get(format!("{}{}", self.base_url, endpoint))
            .query(params)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: &[(&str, String)],
    ) -> Result<ApiResponse<T>> {
        debug!(endpoint, "POST");
        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint))
            .form(form)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiResponse<T>> {
        let status = response.status();
        let quota = QuotaStatus::from_headers(response.headers());
        let bytes = response.bytes().await?;

        if status.is_success() {
            let data = serde_json::from_slice(&bytes)?;
            return Ok(ApiResponse { data, quota });
        }

        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.errors.into_iter().next())
            .map_or_else(
                || String::from_utf8_lossy(&bytes).into_owned(),
                |entry| entry.message,
            );

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ApiTransport for HttpApiClient {
    async fn search(&self, query: &str, count: u32) -> Result<ApiResponse<Vec<Status>>> {
        let response: ApiResponse<SearchResults> = self
            .get(
                "/search/tweets.json",
                &[("q", query.to_string()), ("count", count.to_string())],
            )
            .await?;

        Ok(ApiResponse {
            data: response.data.statuses,
            quota: response.quota,
        })
    }

    async fn home_timeline(&self, count: u32) -> Result<ApiResponse<Vec<Status>>> {
        self.get(
            "/statuses/home_timeline.json",
            &[("count", count.to_string())],
        )
        .await
    }

    async fn mentions_timeline(&self, count: u32) -> Result<ApiResponse<Vec<Status>>> {
        self.get(
            "/statuses/mentions_timeline.json",
            &[("count", count.to_string())],
        )
        .await
    }

    async fn update_status(
        &self,
        text: &str,
        in_reply_to_status_id: Option<u64>,
    ) -> Result<ApiResponse<Status>> {
        let mut form = vec![("status", text.to_string())];
        if let Some(id) = in_reply_to_status_id {
            form.push(("in_reply_to_status_id", id.to_string()));
        }
        self.post("/statuses/update.json", &form).await
    }

    async fn follower_ids(&self, screen_name: &str) -> Result<ApiResponse<IdPage>> {
        self.get(
            "/followers/ids.json",
            &[("screen_name", screen_name.to_string())],
        )
        .await
    }

    async fn friend_ids(&self, screen_name: &str) -> Result<ApiResponse<IdPage>> {
        self.get(
            "/friends/ids.json",
            &[("screen_name", screen_name.to_string())],
        )
        .await
    }

    async fn show_user(&self, id: u64) -> Result<ApiResponse<Account>> {
        self.get("/users/show.json", &[("user_id", id.to_string())])
            .await
    }

    async fn retweet(&self, status_id: u64) -> Result<ApiResponse<Status>> {
        self.post(&format!("/statuses/retweet/{status_id}.json"), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header_exists, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_config(mock_server: &MockServer) -> ApiConfig {
        ApiConfig {
            bearer_token: "test_bearer_token".into(),
            api_url: mock_server.uri(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn show_user_decodes_account_and_quota() {
        let mock_server = MockServer::start().await;
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();

        Mock::given(method("GET"))
            .and(path("/users/show.json"))
            .and(query_param("user_id", "42"))
            .and(header_exists("Authorization"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-rate-limit-remaining", "179")
                    .insert_header("x-rate-limit-reset", (now + 900).to_string().as_str())
                    .set_body_json(serde_json::json!({
                        "id": 42,
                        "screen_name": "wren",
                        "followers_count": 120,
                        "friends_count": 80,
                        "protected": false,
                        "description": "small bird, big opinions",
                        "status": { "id": 7, "text": "chirp" }
                    })),
            )
            .mount(&mock_server)
            .await;

        let client = HttpApiClient::new(&test_config(&mock_server)).unwrap();
        let response = client.show_user(42).await.unwrap();

        assert_eq!(response.data.screen_name, "wren");
        assert_eq!(response.data.most_recent_status.unwrap().id, 7);

        let quota = response.quota.unwrap();
        assert_eq!(quota.remaining, 179);
        assert!(!quota.is_exhausted());
    }

    #[tokio::test]
    async fn search_unwraps_the_statuses_envelope() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/tweets.json"))
            .and(query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "statuses": [
                    { "id": 1, "text": "rust is fast" },
                    { "id": 2, "text": "rust is safe" }
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = HttpApiClient::new(&test_config(&mock_server)).unwrap();
        let response = client.search("rust", 10).await.unwrap();

        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[0].text, "rust is fast");
        assert!(response.quota.is_none());
    }

    #[tokio::test]
    async fn home_timeline_decodes_statuses() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/statuses/home_timeline.json"))
            .and(query_param("count", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": 10,
                    "text": "morning chirp",
                    "user": { "screen_name": "wren" }
                },
                {
                    "id": 11,
                    "text": "@wren hi",
                    "in_reply_to_status_id": 10
                }
            ])))
            .mount(&mock_server)
            .await;

        let client = HttpApiClient::new(&test_config(&mock_server)).unwrap();
        let response = client.home_timeline(2).await.unwrap();

        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[0].author_screen_name(), Some("wren"));
        assert!(!response.data[0].is_reply());
        assert!(response.data[1].is_reply());
    }

    #[tokio::test]
    async fn update_status_posts_a_reply() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/statuses/update.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 100,
                "text": "@finch hello",
                "in_reply_to_status_id": 99
            })))
            .mount(&mock_server)
            .await;

        let client = HttpApiClient::new(&test_config(&mock_server)).unwrap();
        let response = client.update_status("@finch hello", Some(99)).await.unwrap();

        assert_eq!(response.data.id, 100);
        assert!(response.data.is_reply());
    }

    #[tokio::test]
    async fn error_bodies_map_to_api_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/followers/ids.json"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "errors": [{ "code": 32, "message": "Could not authenticate you." }]
            })))
            .mount(&mock_server)
            .await;

        let client = HttpApiClient::new(&test_config(&mock_server)).unwrap();
        let err = client.follower_ids("wren").await.unwrap_err();

        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Could not authenticate you.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn follower_ids_decodes_a_cursored_page() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/followers/ids.json"))
            .and(query_param("screen_name", "wren"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ids": [11, 12, 13],
                "next_cursor": 0
            })))
            .mount(&mock_server)
            .await;

        let client = HttpApiClient::new(&test_config(&mock_server)).unwrap();
        let response = client.follower_ids("wren").await.unwrap();

        assert_eq!(response.data.ids, vec![11, 12, 13]);
        assert_eq!(response.data.next_cursor, 0);
    }

    #[test]
    fn client_requires_a_bearer_token() {
        let config = ApiConfig::default();
        assert!(matches!(
            HttpApiClient::new(&config).unwrap_err(),
            Error::Config(_)
        ));
    }
}
