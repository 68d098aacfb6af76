use std::fs;

use reqwest::header::{COOKIE, HeaderValue, SET_COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tavola_api_types::{ApiErrorBody, LoginRequest, SESSION_COOKIE};
use thiserror::Error;

use crate::args::Cli;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("site URL is required (use --site or TAVOLA_SITE_URL)")]
    MissingSite,
    #[error("admin password is required (use --password-file or TAVOLA_ADMIN_PASSWORD)")]
    MissingPassword,
    #[error("failed to read password file: {0}")]
    PasswordFile(std::io::Error),
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("login was refused: {0}")]
    Login(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Clone, Debug)]
pub struct Ctx {
    pub client: Client,
    pub base: Url,
    password: String,
    session: Option<HeaderValue>,
}

impl Ctx {
    pub fn new(site: &str, password: String) -> Result<Self, CliError> {
        let base = Url::parse(site)?.join("/")?;
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self {
            client,
            base,
            password,
            session: None,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("tavola-cli/", env!("CARGO_PKG_VERSION"))
    }

    pub fn url(&self, path: &str) -> Result<Url, CliError> {
        self.base.join(path).map_err(CliError::Url)
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Exchange the admin password for a session cookie kept on this context.
    pub async fn login(&mut self) -> Result<(), CliError> {
        let response = self
            .client
            .post(self.url("api/auth/login")?)
            .json(&LoginRequest {
                password: self.password.clone(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CliError::Login(format!("status {status} body {text}")));
        }

        let pair = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .find(|pair| {
                pair.split_once('=')
                    .is_some_and(|(name, value)| name.trim() == SESSION_COOKIE && !value.is_empty())
            })
            .ok_or_else(|| CliError::Login("response carried no session cookie".into()))?;

        let header = HeaderValue::from_str(pair.trim())
            .map_err(|err| CliError::Login(err.to_string()))?;
        self.session = Some(header);
        Ok(())
    }

    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, CliError> {
        let mut builder = self.client.request(method, self.url(path)?);
        if let Some(cookie) = &self.session {
            builder = builder.header(COOKIE, cookie.clone());
        }
        Ok(builder)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&[(&str, String)]>,
    ) -> Result<T, CliError> {
        let mut url = self.url(path)?;
        if let Some(query) = query {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        let mut builder = self.client.get(url);
        if let Some(cookie) = &self.session {
            builder = builder.header(COOKIE, cookie.clone());
        }
        Self::handle(builder.send().await?).await
    }

    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, CliError> {
        let response = self.request(method, path)?.json(body).send().await?;
        Self::handle(response).await
    }

    pub async fn send_unit(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<(), CliError> {
        let mut builder = self.request(method, path)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let bytes = response.bytes().await.unwrap_or_default();
            return Err(CliError::Server(describe_failure(status, &bytes)));
        }
        Ok(())
    }

    pub async fn handle<T: DeserializeOwned>(response: Response) -> Result<T, CliError> {
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(CliError::Server(describe_failure(status, &bytes)));
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| CliError::Server(format!("failed to parse body: {e}")))
    }
}

/// Prefer the structured error message over the raw body.
fn describe_failure(status: reqwest::StatusCode, bytes: &[u8]) -> String {
    match serde_json::from_slice::<ApiErrorBody>(bytes) {
        Ok(body) => match body.error.hint {
            Some(hint) => format!(
                "status {status} {}: {} ({hint})",
                body.error.code, body.error.message
            ),
            None => format!(
                "status {status} {}: {}",
                body.error.code, body.error.message
            ),
        },
        Err(_) => format!("status {status} body {}", String::from_utf8_lossy(bytes)),
    }
}

pub fn build_ctx_from_cli(cli: &Cli) -> Result<Ctx, CliError> {
    let site = cli.site.clone().ok_or(CliError::MissingSite)?;
    let password = if let Some(path) = &cli.password_file {
        fs::read_to_string(path)
            .map_err(CliError::PasswordFile)?
            .trim_end_matches(['\r', '\n'])
            .to_string()
    } else {
        cli.password_env.clone().ok_or(CliError::MissingPassword)?
    };

    Ctx::new(&site, password)
}
