//! Organization webhook endpoints.
//!
//! GitHub API docs: <https://docs.github.com/rest/orgs/webhooks>

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Method;

use crate::client::Client;
use crate::error::Result;
use crate::response::Response;
use crate::transport::{Request, Transport};
use crate::types::{Hook, ListOptions};

/// Media type that opts into the organization hooks preview.
pub const ORG_HOOK_PREVIEW: &str = "application/vnd.github.sersi-preview+json";

/// Organization hook operations, borrowed from a [`Client`].
#[derive(Debug)]
pub struct OrganizationsService<'a, T> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> OrganizationsService<'a, T> {
    pub(crate) fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Creates a hook for `owner`. The server requires `name` and `config`.
    pub async fn create_hook(&self, owner: &str, hook: &Hook) -> Result<(Hook, Response)> {
        let path = format!("orgs/{}/hooks", owner);
        let request = self.preview_request(Method::POST, &path, Some(hook))?;
        self.client.execute_json(request).await
    }

    /// Lists the hooks of `owner` in the order the server returns them.
    pub async fn list_hooks(
        &self,
        owner: &str,
        options: Option<&ListOptions>,
    ) -> Result<(Vec<Hook>, Response)> {
        let path = format!("orgs/{}/hooks", owner);
        let mut request = self.preview_request::<Hook>(Method::GET, &path, None)?;
        if let Some(options) = options {
            let pairs = options.query_pairs();
            if !pairs.is_empty() {
                request.url.query_pairs_mut().extend_pairs(pairs);
            }
        }
        self.client.execute_json(request).await
    }

    pub async fn get_hook(&self, owner: &str, id: i64) -> Result<(Hook, Response)> {
        let path = format!("orgs/{}/hooks/{}", owner, id);
        let request = self.preview_request::<Hook>(Method::GET, &path, None)?;
        self.client.execute_json(request).await
    }

    /// Updates a hook; fields left unset on `hook` are not sent.
    pub async fn edit_hook(&self, owner: &str, id: i64, hook: &Hook) -> Result<(Hook, Response)> {
        let path = format!("orgs/{}/hooks/{}", owner, id);
        let request = self.preview_request(Method::PATCH, &path, Some(hook))?;
        self.client.execute_json(request).await
    }

    pub async fn delete_hook(&self, owner: &str, id: i64) -> Result<Response> {
        let path = format!("orgs/{}/hooks/{}", owner, id);
        let request = self.preview_request::<Hook>(Method::DELETE, &path, None)?;
        self.client.execute_empty(request).await
    }

    /// Asks GitHub to deliver a test push event to the hook.
    pub async fn test_hook(&self, owner: &str, id: i64) -> Result<Response> {
        let path = format!("orgs/{}/hooks/{}/tests", owner, id);
        let request = self.preview_request::<Hook>(Method::POST, &path, None)?;
        self.client.execute_empty(request).await
    }

    fn preview_request<B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Request> {
        let mut request = self.client.new_request(method, path, body)?;
        request.set_header(ACCEPT, HeaderValue::from_static(ORG_HOOK_PREVIEW));
        Ok(request)
    }
}
