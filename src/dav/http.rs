use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};

use crate::config::ClientConfig;
use crate::dav::transport::{DavRequest, DavResponse, DavTransport, RequestBody};
use crate::error::AppError;
use crate::scope_path;

const USER_AGENT: &str = concat!("davpicker/", env!("CARGO_PKG_VERSION"));

pub struct HttpTransport {
    client: Client,
    origin: String,
    dav_root: String,
    username: Option<String>,
    password: Option<String>,
    request_token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, AppError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            origin: config.server_url.trim_end_matches('/').to_string(),
            dav_root: config.dav_root_path(),
            username: Some(config.username.clone()).filter(|u| !u.is_empty()),
            password: config.password.clone(),
            request_token: config.request_token.clone(),
        })
    }

    fn url_for(&self, request: &DavRequest) -> String {
        if request.absolute {
            format!("{}{}", self.origin, request.path)
        } else {
            format!(
                "{}{}{}",
                self.origin,
                self.dav_root,
                scope_path::encode(&request.path)
            )
        }
    }
}

#[async_trait]
impl DavTransport for HttpTransport {
    async fn send(&self, request: DavRequest) -> Result<DavResponse, AppError> {
        let method = Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| AppError::General(format!("invalid method {}: {e}", request.method)))?;
        let url = self.url_for(&request);
        tracing::debug!(method = %request.method, %url, "dav request");

        let mut builder = self
            .client
            .request(method, &url)
            .header("X-Requested-With", "XMLHttpRequest");
        if let Some(token) = &self.request_token {
            builder = builder.header("requesttoken", token);
        }
        if let Some(user) = &self.username {
            builder = builder.basic_auth(user, self.password.as_ref());
        }
        if let Some(depth) = request.depth {
            builder = builder.header("Depth", depth.as_str());
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Xml(xml)) => builder
                .header(CONTENT_TYPE, "application/xml; charset=utf-8")
                .body(xml),
            Some(RequestBody::Json(value)) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_string(&value)?),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(DavResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dav::transport::DavMethod;

    fn transport() -> HttpTransport {
        let config = ClientConfig {
            server_url: "https://cloud.example.com/".to_string(),
            username: "alice".to_string(),
            ..ClientConfig::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn dav_paths_are_encoded_under_root() {
        let t = transport();
        let req = DavRequest::new(DavMethod::Propfind, "/files/alice/My Docs");
        assert_eq!(
            t.url_for(&req),
            "https://cloud.example.com/remote.php/dav/files/alice/My%20Docs"
        );
    }

    #[test]
    fn app_paths_skip_dav_root() {
        let t = transport();
        let req = DavRequest::app(DavMethod::Get, "/index.php/apps/systemtags/lastused");
        assert_eq!(
            t.url_for(&req),
            "https://cloud.example.com/index.php/apps/systemtags/lastused"
        );
    }
}
