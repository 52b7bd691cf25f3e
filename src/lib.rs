#![deny(unsafe_code)]

//! Client for an LND node's REST gateway.
//!
//! Requests go over HTTPS with trust pinned to the node's own TLS certificate and
//! carry the hex-encoded macaroon in the `Grpc-Metadata-macaroon` header. Unary
//! calls return a [`Document`] with path-based field lookup; the invoice
//! subscription returns an [`EventStream`] of JSON events.
//!
//! Responses are classified from the body, not the HTTP status: a bare `0` or an
//! `error` object become [`RemoteError`], unparseable bodies become
//! [`LndError::Decode`], and network or TLS failures become [`LndError::Transport`].
//!
//! Example
//! ```no_run
//! use lnd_rest::{credentials::FileCredentials, models::NodeInfo, Lnd};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let creds = FileCredentials::lnd_dir("/home/user/.lnd", "mainnet");
//! let lnd = Lnd::connect("https://127.0.0.1:8080", &creds).await?;
//!
//! let info: NodeInfo = lnd.get_info().await?.parse()?;
//! println!("{} at height {}", info.alias, info.block_height);
//!
//! let invoice = lnd.create_invoice(1_000, "coffee").await?;
//! println!("{}", invoice.str("payment_request").unwrap_or_default());
//!
//! let mut events = lnd.invoices_subscribe().await?;
//! while let Some(invoice) = events.next_invoice().await? {
//!     println!("{} -> {:?}", invoice.memo, invoice.state);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod document;
pub mod models;
pub mod stream;
pub mod transport;

pub use client::{Lnd, LndError, RemoteError, Result};
pub use document::Document;
pub use stream::EventStream;
