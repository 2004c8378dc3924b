use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::auth::{AppCredentials, Credentials, InstallationToken};
use crate::error::{Error, ErrorBody, Result};
use crate::orgs_hooks::OrganizationsService;
use crate::response::Response;
use crate::transport::{HttpTransport, Request, Transport};

pub const DEFAULT_BASE_URL: &str = "https://api.github.com/";
pub const MEDIA_TYPE_V3: &str = "application/vnd.github.v3+json";
const DEFAULT_USER_AGENT: &str = concat!("orghook/", env!("CARGO_PKG_VERSION"));

/// Builds requests against the API and executes them over a [`Transport`].
#[derive(Debug)]
pub struct Client<T = HttpTransport> {
    transport: T,
    base_url: Url,
    user_agent: HeaderValue,
    credentials: Credentials,
}

#[derive(Debug, Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    user_agent: Option<String>,
    credentials: Credentials,
}

impl ClientBuilder {
    /// API root; GitHub Enterprise servers use `https://<host>/api/v3/`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn build(self) -> Result<Client> {
        let http = reqwest::Client::builder().build()?;
        self.build_with(HttpTransport::new(http))
    }

    pub fn build_with<T: Transport>(self, transport: T) -> Result<Client<T>> {
        let mut base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)?;

        let user_agent = self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let user_agent = HeaderValue::from_str(user_agent)?;

        Ok(Client {
            transport,
            base_url,
            user_agent,
            credentials: self.credentials,
        })
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }
}

impl<T: Transport> Client<T> {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn organizations(&self) -> OrganizationsService<'_, T> {
        OrganizationsService::new(self)
    }

    /// Builds a request for `path`, relative to the base URL, with `body`
    /// encoded as JSON.
    pub fn new_request<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Request>
    where
        B: Serialize + ?Sized,
    {
        let url = self.base_url.join(path)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE_V3));
        headers.insert(USER_AGENT, self.user_agent.clone());
        if let Some(authorization) = self.credentials.authorization()? {
            headers.insert(AUTHORIZATION, authorization);
        }

        let body = match body {
            Some(body) => {
                let encoded = serde_json::to_vec(body).map_err(Error::Encode)?;
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(Bytes::from(encoded))
            }
            None => None,
        };

        Ok(Request {
            method,
            url,
            headers,
            body,
        })
    }

    /// Sends `request` and decodes the response body into `D`.
    pub async fn execute_json<D: DeserializeOwned>(&self, request: Request) -> Result<(D, Response)> {
        let (response, body) = self.execute(request).await?;
        match serde_json::from_slice(&body) {
            Ok(value) => Ok((value, response)),
            Err(source) => Err(Error::Decode {
                response: Box::new(response),
                source,
            }),
        }
    }

    /// Sends `request`, discarding any response body.
    pub async fn execute_empty(&self, request: Request) -> Result<Response> {
        let (response, _) = self.execute(request).await?;
        Ok(response)
    }

    async fn execute(&self, request: Request) -> Result<(Response, Bytes)> {
        let url = request.url.clone();
        debug!(method = %request.method, url = %url, "sending request");

        let raw = self.transport.send(request).await?;
        let response = Response::new(raw.status, url, raw.headers);
        debug!(status = %response.status, url = %response.url, "received response");

        if response.status.is_success() {
            return Ok((response, raw.body));
        }

        let error: ErrorBody = serde_json::from_slice(&raw.body).unwrap_or_default();
        let message = error.message.unwrap_or_else(|| {
            response
                .status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        Err(Error::Api {
            response: Box::new(response),
            message,
            errors: error.errors,
            documentation_url: error.documentation_url,
        })
    }

    /// Mints an App JWT and exchanges it for an installation access token.
    pub async fn installation_token(&self, app: &AppCredentials, installation_id: i64) -> Result<String> {
        let jwt = app.generate_jwt()?;
        let token = self.exchange_installation_token(&jwt, installation_id).await?;
        debug!(installation_id, app_id = app.app_id(), "obtained installation token");
        Ok(token)
    }

    /// Exchanges an already minted App JWT for an installation access token.
    pub async fn exchange_installation_token(&self, jwt: &str, installation_id: i64) -> Result<String> {
        let path = format!("app/installations/{}/access_tokens", installation_id);

        let mut request = self.new_request::<()>(Method::POST, &path, None)?;
        if let Some(authorization) = Credentials::Bearer(jwt.to_string()).authorization()? {
            request.set_header(AUTHORIZATION, authorization);
        }

        let (token, _): (InstallationToken, _) = self.execute_json(request).await?;
        Ok(token.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, RawResponse};
    use reqwest::StatusCode;
    use serde_json::json;

    fn raw(status: StatusCode, body: serde_json::Value) -> RawResponse {
        RawResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn client(transport: MockTransport) -> Client<MockTransport> {
        Client::builder()
            .base_url("https://ghe.example.com/api/v3")
            .credentials(Credentials::Token("t0ken".into()))
            .build_with(transport)
            .unwrap()
    }

    #[test]
    fn new_request_resolves_against_base_url() {
        let client = client(MockTransport::new());

        let request = client
            .new_request(Method::POST, "orgs/octocat/hooks", Some(&json!({ "name": "web" })))
            .unwrap();

        assert_eq!(request.url.as_str(), "https://ghe.example.com/api/v3/orgs/octocat/hooks");
        assert_eq!(request.header(ACCEPT), Some(MEDIA_TYPE_V3));
        assert_eq!(request.header(AUTHORIZATION), Some("token t0ken"));
        assert_eq!(request.header(CONTENT_TYPE), Some("application/json"));
        assert_eq!(request.header(USER_AGENT), Some(DEFAULT_USER_AGENT));
        assert_eq!(request.body.as_deref(), Some(&br#"{"name":"web"}"#[..]));
    }

    #[test]
    fn new_request_without_body_has_no_content_type() {
        let client = client(MockTransport::new());

        let request = client.new_request::<()>(Method::GET, "orgs/octocat/hooks", None).unwrap();

        assert!(request.body.is_none());
        assert!(request.header(CONTENT_TYPE).is_none());
    }

    #[test]
    fn malformed_token_fails_request_construction() {
        let client = Client::builder()
            .credentials(Credentials::Token("ghp_abc\n".into()))
            .build_with(MockTransport::new())
            .unwrap();

        let result = client.new_request::<()>(Method::GET, "orgs/octocat/hooks", None);

        assert!(matches!(result, Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn invalid_user_agent_is_rejected() {
        let result = Client::builder()
            .user_agent("orghook\r\nx-injected: 1")
            .build_with(MockTransport::new());
        assert!(matches!(result, Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn unparsable_base_url_is_rejected() {
        let result = Client::builder().base_url("not a url").build_with(MockTransport::new());
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn non_success_status_becomes_api_error() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(raw(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "message": "Validation Failed",
                    "errors": [{ "resource": "Hook", "code": "custom", "message": "Config url is missing" }],
                    "documentation_url": "https://docs.github.com/rest"
                }),
            ))
        });
        let client = client(transport);

        let request = client.new_request::<()>(Method::GET, "orgs/octocat/hooks/1", None).unwrap();
        let err = client.execute_empty(request).await.unwrap_err();

        match err {
            Error::Api {
                response,
                message,
                errors,
                documentation_url,
            } => {
                assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(message, "Validation Failed");
                assert_eq!(errors[0].resource.as_deref(), Some("Hook"));
                assert_eq!(documentation_url.as_deref(), Some("https://docs.github.com/rest"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_without_json_body_uses_status_reason() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_| {
            Ok(RawResponse {
                status: StatusCode::BAD_GATEWAY,
                headers: HeaderMap::new(),
                body: Bytes::from_static(b"<html>bad gateway</html>"),
            })
        });
        let client = client(transport);

        let request = client.new_request::<()>(Method::GET, "orgs/octocat/hooks", None).unwrap();
        let err = client.execute_empty(request).await.unwrap_err();

        assert!(matches!(&err, Error::Api { message, .. } if message == "Bad Gateway"));
        assert_eq!(err.response().unwrap().status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn undecodable_success_body_becomes_decode_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(raw(StatusCode::OK, json!("not a token object"))));
        let client = client(transport);

        let request = client.new_request::<()>(Method::GET, "orgs/octocat/hooks/1", None).unwrap();
        let err = client
            .execute_json::<InstallationToken>(request)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Decode { .. }));
        assert_eq!(err.response().unwrap().status, StatusCode::OK);
    }
}
