// HTTP transport used by the Last.fm client

use super::error::ScrobbleError;

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport {
    /// POST `params` as an `application/x-www-form-urlencoded` body
    fn post_form(&self, url: &str, params: &[(String, String)]) -> Result<HttpResponse, ScrobbleError>;

    /// GET with `params` in the query string
    fn get(&self, url: &str, params: &[(String, String)]) -> Result<HttpResponse, ScrobbleError>;
}

/// Blocking transport on top of attohttpc
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn post_form(&self, url: &str, params: &[(String, String)]) -> Result<HttpResponse, ScrobbleError> {
        let response = attohttpc::post(url).form(&params)?.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }

    fn get(&self, url: &str, params: &[(String, String)]) -> Result<HttpResponse, ScrobbleError> {
        let response = attohttpc::get(url).params(params).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub use fake::{FakeTransport, SentRequest};
