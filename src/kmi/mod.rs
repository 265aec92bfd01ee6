//! Client for the KMI REST API.
//!
//! KMI speaks XML over mutually authenticated HTTPS. Every operation maps
//! to a single request: objects are created and updated with a POST of
//! the full desired document, read with a GET and removed with a DELETE.

mod account;
mod collection;
mod definition;
mod engine;
mod group;
mod template;
mod workload;

pub use self::account::*;
pub use self::collection::*;
pub use self::definition::*;
pub use self::engine::*;
pub use self::group::*;
pub use self::template::*;
pub use self::workload::*;

use std::{fmt, io};

use log::{debug, info};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Url;

use crate::commons::util::httpclient;
use crate::commons::util::xml::XmlReaderErr;
use crate::config::ConnectionSettings;

/// Characters that must be escaped in a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

//------------ FromXml / ToXml -----------------------------------------------

/// A KMI response document.
pub trait FromXml: Sized {
    fn from_xml(xml: &str) -> Result<Self, XmlReaderErr>;
}

/// A KMI request document.
pub trait ToXml {
    fn to_xml(&self) -> Result<String, io::Error>;
}

//------------ KmiClient -----------------------------------------------------

/// A client bound to a single KMI server.
#[derive(Clone, Debug)]
pub struct KmiClient {
    host: String,
    client: reqwest::Client,
}

impl KmiClient {
    /// Creates a client from resolved connection settings.
    ///
    /// This loads the credentials, from files if so configured, and sets
    /// up mutual TLS trusting only the configured CA bundle.
    pub fn new(settings: &ConnectionSettings) -> Result<Self, Error> {
        let host = Self::check_host(&settings.host)?;

        let key = settings
            .api_key
            .load()
            .map_err(|e| Error::credentials("client key", &settings.api_key, e))?;
        let crt = settings
            .api_crt
            .load()
            .map_err(|e| Error::credentials("client certificate", &settings.api_crt, e))?;
        let ca = settings
            .akamai_ca
            .load()
            .map_err(|e| Error::credentials("CA bundle", &settings.akamai_ca, e))?;

        let client = httpclient::tls_client(
            &host,
            &crt,
            &key,
            &ca,
            settings.proxy_host.as_deref(),
            settings.timeout,
        )?;

        info!("Configured KMI client for {}", host);
        if let Some(proxy) = &settings.proxy_host {
            debug!("Using proxy {} for KMI requests", proxy);
        }

        Ok(KmiClient { host, client })
    }

    /// Creates a client that uses an already configured HTTP client.
    pub fn with_http_client(host: &str, client: reqwest::Client) -> Result<Self, Error> {
        let host = Self::check_host(host)?;
        Ok(KmiClient { host, client })
    }

    /// Returns the base URL of the KMI server.
    pub fn host(&self) -> &str {
        &self.host
    }

    fn check_host(host: &str) -> Result<String, Error> {
        let url = Url::parse(host).map_err(|e| Error::InvalidHost(host.to_string(), e.to_string()))?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(Error::InvalidHost(host.to_string(), "not an absolute URL".to_string()));
        }
        Ok(host.trim_end_matches('/').to_string())
    }

    /// Builds the URI for a path of `key=value` segments below `root`.
    fn uri(&self, root: &str, segments: &[(&str, &str)]) -> String {
        let mut uri = format!("{}/{}", self.host, root);
        for (key, value) in segments {
            uri.push('/');
            uri.push_str(key);
            uri.push('=');
            uri.extend(utf8_percent_encode(value, SEGMENT));
        }
        uri
    }

    async fn get<T: FromXml>(&self, uri: &str) -> Result<T, Error> {
        let xml = httpclient::get_xml(&self.client, uri).await?;
        T::from_xml(&xml).map_err(|e| Error::xml(uri, e))
    }

    async fn post<T: ToXml>(&self, uri: &str, document: &T) -> Result<(), Error> {
        let body = document.to_xml().map_err(Error::Encode)?;
        self.post_raw(uri, body).await
    }

    async fn post_raw(&self, uri: &str, body: String) -> Result<(), Error> {
        httpclient::post_xml(&self.client, uri, body).await?;
        Ok(())
    }

    async fn delete(&self, uri: &str) -> Result<(), Error> {
        httpclient::delete(&self.client, uri).await?;
        Ok(())
    }
}

//------------ Error ---------------------------------------------------------

#[derive(Debug)]
pub enum Error {
    Http(httpclient::Error),
    Xml(String, XmlReaderErr),
    Encode(io::Error),
    Credentials(String, String, io::Error),
    InvalidHost(String, String),
    InvalidServiceAccount(String),
    NotDistributed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Http(e) => e.fmt(f),
            Error::Xml(uri, e) => write!(f, "Cannot parse response from URI: {}, error: {}", uri, e),
            Error::Encode(e) => write!(f, "Cannot encode request: {}", e),
            Error::Credentials(what, source, e) => write!(f, "Cannot read {} from {}: {}", what, source, e),
            Error::InvalidHost(host, msg) => write!(f, "Invalid KMI host '{}': {}", host, msg),
            Error::InvalidServiceAccount(account) => write!(
                f,
                "unexpected service account format '{}', expected system:serviceaccount:<namespace>:<name>",
                account
            ),
            Error::NotDistributed(collection) => write!(f, "collection '{}' is not distributed yet", collection),
        }
    }
}

impl std::error::Error for Error {}

impl From<httpclient::Error> for Error {
    fn from(e: httpclient::Error) -> Self {
        Error::Http(e)
    }
}

impl Error {
    pub fn xml(uri: &str, e: XmlReaderErr) -> Self {
        Error::Xml(uri.to_string(), e)
    }

    pub fn credentials(what: &str, source: &impl fmt::Display, e: io::Error) -> Self {
        Error::Credentials(what.to_string(), source.to_string(), e)
    }

    /// Returns whether the KMI server reported that the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_not_found())
    }
}

//------------ Tests ---------------------------------------------------------
