//! Various provider-wide constants.

//------------ Names ---------------------------------------------------------

/// The version of this crate.
pub const KMI_PROVIDER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The type name of the provider. Resource type names start with it.
pub const KMI_PROVIDER_TYPE_NAME: &str = "kmi";

/// The friendly name of the `kmic` binary.
pub const KMI_CLIENT_APP: &str = "KMI Provider Client";

/// The value of the User-Agent header sent to the KMI server.
pub fn user_agent() -> String {
    format!("kmi-provider/{}", KMI_PROVIDER_VERSION)
}


//------------ Environment Variables ----------------------------------------

/// The environment variable with the URL of the KMI server.
pub const KMI_ENV_HOST: &str = "KMI_HOST";

/// The environment variable with the client private key in PEM format.
pub const KMI_ENV_API_KEY: &str = "KMI_API_KEY";

/// The environment variable with the client certificate in PEM format.
pub const KMI_ENV_API_CRT: &str = "KMI_API_CRT";

/// The environment variable with the CA bundle trusted for the KMI server.
pub const KMI_ENV_AKAMAI_CA: &str = "KMI_AKAMAI_CA";

/// The environment variable with the path to the client private key.
pub const KMI_ENV_API_KEY_PATH: &str = "KMI_API_KEY_PATH";

/// The environment variable with the path to the client certificate.
pub const KMI_ENV_API_CRT_PATH: &str = "KMI_API_CRT_PATH";

/// The environment variable with the path to the CA bundle.
pub const KMI_ENV_AKAMAI_CA_PATH: &str = "KMI_AKAMAI_CA_PATH";

/// The environment variable with an optional proxy for all KMI requests.
pub const KMI_ENV_PROXY_HOST: &str = "KMI_PROXY_HOST";

/// The environment variable with the log level.
///
/// The variable should contain the name of a [`log::LevelFilter`]. It will
/// be overwritten by the config file. The default is “warn.”
pub const KMI_ENV_LOG_LEVEL: &str = "KMI_LOG_LEVEL";


//------------ Timing --------------------------------------------------------

/// Timeout for a single HTTP request to the KMI server.
pub const HTTP_CLIENT_TIMEOUT_SECS: u64 = 30;

/// Delay before the first re-read of a collection that is not distributed.
pub const COLLECTION_RETRY_INITIAL_SECS: u64 = 120;

/// Factor applied to the delay after every unsuccessful re-read.
pub const COLLECTION_RETRY_MULTIPLIER: f64 = 2.0;

/// Give up waiting for distribution after this many seconds.
pub const COLLECTION_RETRY_MAX_ELAPSED_SECS: u64 = 1800;


//------------ KMI protocol --------------------------------------------------

/// The type of all identity engines managed by the provider.
pub const ENGINE_TYPE_KUBERNETES: &str = "kubernetes";

/// The cloud used for identity engines that do not name one.
pub const ENGINE_DEFAULT_CLOUD: &str = "linode";

/// The only group type the provider creates.
pub const GROUP_TYPE_UNION: &str = "union";

/// The index that lets KMI pick the next free secret index.
pub const SECRET_AUTOINDEX: &str = "AUTOINDEX";
