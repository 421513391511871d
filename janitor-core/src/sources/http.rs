use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::SourceError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin JSON client for the `/api/v3` surface shared by Radarr and Sonarr.
#[derive(Debug, Clone)]
pub struct ArrHttp {
    instance: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ArrHttp {
    pub fn new(
        instance: impl Into<String>,
        base_url: &str,
        api_key: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let instance = instance.into();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| SourceError::Http {
                instance: instance.clone(),
                source,
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            instance,
            client,
        })
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    fn url(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Url, SourceError> {
        let raw = format!("{}/api/v3/{}", self.base_url, endpoint);
        let mut url = Url::parse(&raw).map_err(|source| SourceError::Url {
            instance: self.instance.clone(),
            source,
        })?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn http_error(&self, source: reqwest::Error) -> SourceError {
        SourceError::Http {
            instance: self.instance.clone(),
            source,
        }
    }

    fn check_status(
        &self,
        endpoint: &str,
        response: &reqwest::Response,
    ) -> Result<(), SourceError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SourceError::Status {
                instance: self.instance.clone(),
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = self.url(endpoint, params)?;
        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|err| self.http_error(err))?;
        self.check_status(endpoint, &response)?;
        let body = response.bytes().await.map_err(|err| self.http_error(err))?;
        serde_json::from_slice(&body).map_err(|err| SourceError::Payload {
            instance: self.instance.clone(),
            message: format!("{endpoint}: {err}"),
        })
    }

    /// POSTs a JSON body. The response body is not interpreted.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<(), SourceError> {
        let url = self.url(endpoint, &[])?;
        let mut request =
            self.client.post(url).header("X-Api-Key", &self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response =
            request.send().await.map_err(|err| self.http_error(err))?;
        self.check_status(endpoint, &response)
    }

    pub async fn delete(&self, endpoint: &str) -> Result<(), SourceError> {
        let url = self.url(endpoint, &[])?;
        let response = self
            .client
            .delete(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|err| self.http_error(err))?;
        self.check_status(endpoint, &response)
    }
}
