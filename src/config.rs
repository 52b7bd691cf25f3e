use crate::transport::TransportError;

/// Default address of LND's REST listener.
pub const DEFAULT_REST_HOST: &str = "https://127.0.0.1:8080";

/// Header carrying the hex-encoded macaroon on every request.
pub const MACAROON_HEADER: &str = "Grpc-Metadata-macaroon";

/// Credentials and endpoint used to build a [`crate::transport::rest::RestTransport`].
#[derive(Clone, PartialEq, Eq)]
pub struct LndConfig {
    /// REST endpoint, e.g. `https://127.0.0.1:8080`. A missing scheme is treated as `https`.
    pub host: String,
    /// PEM-encoded certificate(s) the server must chain to.
    pub tls_cert: Vec<u8>,
    /// Macaroon rendered as lowercase hex.
    pub macaroon_hex: String,
}

impl std::fmt::Debug for LndConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LndConfig")
            .field("host", &self.host)
            .field("tls_cert_len", &self.tls_cert.len())
            .field("macaroon_hex", &"<redacted>")
            .finish()
    }
}

impl LndConfig {
    /// Build a config from raw macaroon bytes, hex-encoding them.
    #[must_use]
    pub fn new(host: impl Into<String>, tls_cert: Vec<u8>, macaroon: &[u8]) -> Self {
        Self {
            host: host.into(),
            tls_cert,
            macaroon_hex: hex::encode(macaroon),
        }
    }

    /// Build a config from a macaroon that is already hex-encoded.
    #[must_use]
    pub fn with_macaroon_hex(
        host: impl Into<String>,
        tls_cert: Vec<u8>,
        macaroon_hex: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            tls_cert,
            macaroon_hex: macaroon_hex.into(),
        }
    }

    /// Host with an explicit scheme and without a trailing slash.
    #[must_use]
    pub fn normalized_host(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{host}")
        }
    }

    /// Check the invariants the transport relies on.
    ///
    /// The certificate itself is parsed when the TLS config is built.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidConfig`] for an empty host, an empty
    /// certificate, or a macaroon that is empty or not hex.
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.host.trim().is_empty() {
            return Err(TransportError::InvalidConfig("host is empty".into()));
        }
        if self.tls_cert.is_empty() {
            return Err(TransportError::InvalidConfig("TLS certificate is empty".into()));
        }
        if self.macaroon_hex.is_empty() {
            return Err(TransportError::InvalidConfig("macaroon is empty".into()));
        }
        if hex::decode(&self.macaroon_hex).is_err() {
            return Err(TransportError::InvalidConfig("macaroon is not valid hex".into()));
        }
        Ok(())
    }
}
