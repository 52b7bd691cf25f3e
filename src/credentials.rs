use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Source of the raw credential material needed to talk to a node.
///
/// Implementations return bytes exactly as stored: PEM for the certificate and the
/// binary macaroon (hex encoding happens when the client is built).
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// PEM-encoded TLS certificate of the node.
    async fn tls_cert(&self) -> io::Result<Vec<u8>>;
    /// Binary macaroon.
    async fn macaroon(&self) -> io::Result<Vec<u8>>;
}

/// Credentials read from files on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileCredentials {
    pub tls_cert_path: PathBuf,
    pub macaroon_path: PathBuf,
}

impl FileCredentials {
    #[must_use]
    pub fn new(tls_cert_path: impl Into<PathBuf>, macaroon_path: impl Into<PathBuf>) -> Self {
        Self {
            tls_cert_path: tls_cert_path.into(),
            macaroon_path: macaroon_path.into(),
        }
    }

    /// Resolve LND's default layout: `<dir>/tls.cert` and
    /// `<dir>/data/chain/bitcoin/<network>/admin.macaroon`.
    #[must_use]
    pub fn lnd_dir(lnd_dir: impl AsRef<Path>, network: &str) -> Self {
        let dir = lnd_dir.as_ref();
        Self {
            tls_cert_path: dir.join("tls.cert"),
            macaroon_path: dir
                .join("data")
                .join("chain")
                .join("bitcoin")
                .join(network)
                .join("admin.macaroon"),
        }
    }
}

#[async_trait]
impl CredentialSource for FileCredentials {
    async fn tls_cert(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.tls_cert_path).await
    }

    async fn macaroon(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.macaroon_path).await
    }
}

/// Credentials already held in memory, e.g. fetched from a secrets manager.
#[derive(Default, Clone, Debug, Serialize, Deserialize)]
pub struct InMemoryCredentials {
    pub tls_cert: Vec<u8>,
    pub macaroon: Vec<u8>,
}

impl InMemoryCredentials {
    #[must_use]
    pub fn new(tls_cert: Vec<u8>, macaroon: Vec<u8>) -> Self {
        Self { tls_cert, macaroon }
    }
}

#[async_trait]
impl CredentialSource for InMemoryCredentials {
    async fn tls_cert(&self) -> io::Result<Vec<u8>> {
        Ok(self.tls_cert.clone())
    }

    async fn macaroon(&self) -> io::Result<Vec<u8>> {
        Ok(self.macaroon.clone())
    }
}
