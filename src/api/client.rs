use reqwest::{multipart, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::AppConfig;
use crate::error::{detail_from_body, ClientError};
use crate::guard::routes::LANDING;
use crate::session::SessionContext;

pub const REFRESH_PATH: &str = "/api/auth/token/refresh/";

/// One multipart field
#[derive(Debug, Clone)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// A request that can be replayed after a token refresh.
///
/// `reqwest::RequestBuilder` cannot clone multipart bodies, so calls are
/// kept as plain data and rebuilt for every attempt.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl Call {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Body::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Body::Multipart(parts);
        self
    }
}

/// HTTP client bound to one backend and one session
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    session: SessionContext,
    landing: String,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionContext) -> Result<Self, ClientError> {
        Self::with_http(base_url, session, reqwest::Client::new())
    }

    pub fn from_config(config: &AppConfig, session: SessionContext) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Self::with_http(&config.api.base_url, session, http)
    }

    pub fn with_http(
        base_url: &str,
        session: SessionContext,
        http: reqwest::Client,
    ) -> Result<Self, ClientError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::config(format!("invalid API base '{}': {}", base_url, e)))?;
        Ok(Self {
            http,
            base,
            session,
            landing: LANDING.to_string(),
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        // Plain concatenation keeps any path prefix on the base
        let base = self.base.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, path))
            .map_err(|e| ClientError::config(format!("invalid path '{}': {}", path, e)))
    }

    fn build(&self, call: &Call, token: Option<&str>) -> Result<reqwest::RequestBuilder, ClientError> {
        let mut request = self.http.request(call.method.clone(), self.url(&call.path)?);

        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request = match &call.body {
            Body::Empty => request,
            Body::Json(value) => request.json(value),
            Body::Multipart(parts) => {
                let mut form = multipart::Form::new();
                for part in parts {
                    form = match part {
                        FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
                        FormPart::File {
                            name,
                            file_name,
                            bytes,
                        } => form.part(
                            name.clone(),
                            multipart::Part::bytes(bytes.clone())
                                .file_name(file_name.clone())
                                .mime_str("application/pdf")?,
                        ),
                    };
                }
                request.multipart(form)
            }
        };

        Ok(request)
    }

    async fn dispatch(&self, call: &Call, token: Option<&str>) -> Result<Response, ClientError> {
        tracing::debug!(
            "{} {} (auth: {})",
            call.method,
            call.path,
            if token.is_some() { "bearer" } else { "none" }
        );
        Ok(self.build(call, token)?.send().await?)
    }

    /// POST without credentials (login, signup)
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let call = Call::post(path).json(body)?;
        let response = self.dispatch(&call, None).await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let parsed: Option<Value> = serde_json::from_slice(&bytes).ok();
        if !status.is_success() {
            return Err(ClientError::api(
                status.as_u16(),
                detail_from_body(parsed.as_ref(), "Invalid response"),
            ));
        }
        match parsed {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(ClientError::api(status.as_u16(), "Invalid response")),
        }
    }

    /// Authenticated call with a single refresh-and-retry on 401.
    ///
    /// A failed refresh clears the session and yields
    /// [`ClientError::SessionExpired`] pointing at the landing route; the
    /// original call is not replayed in that case.
    pub async fn auth_fetch<T: DeserializeOwned>(&self, call: Call) -> Result<T, ClientError> {
        let token = self.session.access_token();
        let mut response = self.dispatch(&call, token.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if self.refresh_access().await {
                let token = self.session.access_token();
                response = self.dispatch(&call, token.as_deref()).await?;
            } else {
                if let Err(e) = self.session.logout() {
                    tracing::warn!("Failed to clear session after refresh failure: {}", e);
                }
                return Err(ClientError::session_expired(self.landing.clone()));
            }
        }

        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let parsed: Option<Value> = serde_json::from_slice(&bytes).ok();
            return Err(ClientError::api(
                status.as_u16(),
                detail_from_body(parsed.as_ref(), "Request failed"),
            ));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Exchange the stored refresh token for a new access token.
    /// Returns false on any failure; never errors.
    pub async fn refresh_access(&self) -> bool {
        let Some(refresh) = self.session.refresh_token() else {
            tracing::warn!("Access token rejected and no refresh token stored");
            return false;
        };

        let call = match Call::post(REFRESH_PATH).json(&serde_json::json!({ "refresh": refresh })) {
            Ok(call) => call,
            Err(_) => return false,
        };

        let response = match self.dispatch(&call, None).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Token refresh request failed: {}", e);
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Token refresh rejected with {}", response.status());
            return false;
        }

        let access = match response.json::<Value>().await {
            Ok(body) => body
                .get("access")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            Err(e) => {
                tracing::warn!("Token refresh returned unreadable body: {}", e);
                None
            }
        };

        match access {
            Some(access) => match self.session.replace_access(&access) {
                Ok(()) => {
                    tracing::info!("Access token refreshed");
                    true
                }
                Err(e) => {
                    tracing::warn!("Could not store refreshed token: {}", e);
                    false
                }
            },
            None => false,
        }
    }
}
