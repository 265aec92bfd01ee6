//! Some helper functions for HTTP calls
use std::{fmt, time::Duration};

use log::trace;
use reqwest::{
    Response, StatusCode,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::constants::user_agent;

const XML_CONTENT: &str = "application/xml";

/// Builds the mutually authenticated client for a KMI server.
///
/// The client presents the given certificate and key, and trusts only the
/// given CA bundle for the server certificate.
#[allow(clippy::result_large_err)]
pub fn tls_client(
    host: &str,
    cert_pem: &[u8],
    key_pem: &[u8],
    ca_pem: &[u8],
    proxy: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, Error> {
    let mut identity_pem = cert_pem.to_vec();
    if !identity_pem.ends_with(b"\n") {
        identity_pem.push(b'\n');
    }
    identity_pem.extend_from_slice(key_pem);

    let identity = reqwest::Identity::from_pem(&identity_pem).map_err(|e| Error::request_build_tls("client identity", e))?;

    let roots = reqwest::Certificate::from_pem_bundle(ca_pem).map_err(|e| Error::request_build_tls("CA bundle", e))?;
    if roots.is_empty() {
        return Err(Error::request_build_tls("CA bundle", "no certificates found"));
    }

    let mut builder = reqwest::ClientBuilder::new()
        .use_rustls_tls()
        .timeout(timeout)
        .identity(identity)
        .tls_built_in_root_certs(false);

    for cert in roots {
        builder = builder.add_root_certificate(cert);
    }

    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| Error::request_build(host, e))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| Error::request_build(host, e))
}

/// Performs a GET request that expects an XML document in a 200 OK
/// response. Returns [`Error::NotFound`] for a 404 response.
pub async fn get_xml(client: &reqwest::Client, uri: &str) -> Result<String, Error> {
    trace!("GET {}", uri);

    let headers = headers(uri, None)?;
    let res = client
        .get(uri)
        .headers(headers)
        .send()
        .await
        .map_err(|e| Error::execute(uri, e))?;

    match opt_text_response(uri, res).await? {
        None => Err(Error::response(uri, "got empty response body")),
        Some(body) => {
            trace!("Response from {}: {}", uri, body);
            Ok(body)
        }
    }
}

/// Performs a POST of an XML document, and expects a 204 No Content
/// or 200 OK response. Any response body is ignored.
pub async fn post_xml(client: &reqwest::Client, uri: &str, body: String) -> Result<(), Error> {
    trace!("POST {}\n{}", uri, body);

    let headers = headers(uri, Some(XML_CONTENT))?;
    let res = client
        .post(uri)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| Error::execute(uri, e))?;

    match res.status() {
        StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
        _ => Err(Error::from_res(uri, res).await),
    }
}

/// Sends a delete request to the specified url. A 404 response means the
/// object is already gone and counts as success.
pub async fn delete(client: &reqwest::Client, uri: &str) -> Result<(), Error> {
    trace!("DELETE {}", uri);

    let headers = headers(uri, None)?;
    let res = client
        .delete(uri)
        .headers(headers)
        .send()
        .await
        .map_err(|e| Error::execute(uri, e))?;

    match res.status() {
        StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(()),
        _ => Err(Error::from_res(uri, res).await),
    }
}

#[allow(clippy::result_large_err)]
fn headers(uri: &str, content_type: Option<&str>) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&user_agent()).map_err(|e| Error::request_build(uri, e))?,
    );

    if let Some(content_type) = content_type {
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(content_type).map_err(|e| Error::request_build(uri, e))?,
        );
    }
    Ok(headers)
}

async fn opt_text_response(uri: &str, res: Response) -> Result<Option<String>, Error> {
    match res.status() {
        StatusCode::OK => match res.text().await.ok() {
            None => Ok(None),
            Some(s) => {
                if s.trim().is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(s))
                }
            }
        },
        StatusCode::NOT_FOUND => Err(Error::NotFound(uri.to_string())),
        StatusCode::FORBIDDEN => Err(Error::Forbidden(uri.to_string())),
        _ => Err(Error::from_res(uri, res).await),
    }
}

//------------ Error ---------------------------------------------------------

type ErrorUri = String;
type ErrorMessage = String;

#[derive(Debug)]
pub enum Error {
    RequestBuild(ErrorUri, ErrorMessage),
    RequestBuildTls(String, ErrorMessage),

    RequestExecute(ErrorUri, ErrorMessage),

    Response(ErrorUri, ErrorMessage),
    NotFound(ErrorUri),
    Forbidden(ErrorUri),
    ErrorResponseWithBody(ErrorUri, StatusCode, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::RequestBuild(uri, msg) => write!(f, "Issue creating request for URI: {}, error: {}", uri, msg),
            Error::RequestBuildTls(what, msg) => {
                write!(f, "Cannot use configured TLS {}. Error: {}", what, msg)
            }

            Error::RequestExecute(uri, msg) => write!(f, "Issue accessing URI: {}, error: {}", uri, msg),

            Error::Response(uri, msg) => write!(f, "Issue processing response from URI: {}, error: {}", uri, msg),
            Error::NotFound(uri) => write!(f, "Got 'Not Found' response for URI: {}", uri),
            Error::Forbidden(uri) => write!(f, "Got 'Forbidden' response for URI: {}", uri),
            Error::ErrorResponseWithBody(uri, code, e) => {
                write!(f, "Error response from URI: {}, Status: {}, Error: {}", uri, code, e)
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn request_build(uri: &str, msg: impl fmt::Display) -> Self {
        Error::RequestBuild(uri.to_string(), msg.to_string())
    }

    pub fn request_build_tls(what: &str, msg: impl fmt::Display) -> Self {
        Error::RequestBuildTls(what.to_string(), msg.to_string())
    }

    pub fn execute(uri: &str, msg: impl fmt::Display) -> Self {
        Error::RequestExecute(uri.to_string(), msg.to_string())
    }

    pub fn response(uri: &str, msg: impl fmt::Display) -> Self {
        Error::Response(uri.to_string(), msg.to_string())
    }

    pub fn unexpected_status(status: StatusCode) -> String {
        format!("unexpected status code {}", status)
    }

    pub fn response_unexpected_status(uri: &str, status: StatusCode) -> Self {
        Error::Response(uri.to_string(), Self::unexpected_status(status))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    async fn from_res(uri: &str, res: Response) -> Error {
        let status = res.status();
        match res.text().await {
            Ok(body) => {
                if body.is_empty() {
                    Self::response_unexpected_status(uri, status)
                } else {
                    Error::ErrorResponseWithBody(uri.to_string(), status, body)
                }
            }
            _ => Self::response_unexpected_status(uri, status),
        }
    }
}

//------------ Tests ---------------------------------------------------------
