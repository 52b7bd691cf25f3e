//! Local HTTPS stand-in for LND's REST gateway.

#![allow(dead_code)]

use std::{
    convert::Infallible,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
};

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{combinators::UnsyncBoxBody, BodyExt as _, Full, StreamBody};
use hyper::{
    body::{Frame, Incoming},
    server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose, SanType};
use tokio::{net::TcpListener, sync::mpsc};
use tokio_rustls::{
    rustls::{
        crypto::aws_lc_rs,
        pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer},
        ServerConfig,
    },
    TlsAcceptor,
};

/// Raw macaroon bytes the test node accepts.
pub const MACAROON: [u8; 3] = [0x02, 0x01, 0x03];

const GETINFO: &str = r#"{"identity_pubkey":"02ab","alias":"alice","block_height":800000,"synced_to_chain":true}"#;

type ServerBody = UnsyncBoxBody<Bytes, Infallible>;

/// Server certificate chain plus the PEM a client should pin.
pub struct Identity {
    pub trust_pem: String,
    pub chain: Vec<CertificateDer<'static>>,
    pub key: PrivateKeyDer<'static>,
}

fn leaf_params() -> CertificateParams {
    let mut params = CertificateParams::new(vec!["localhost".to_string()]).expect("leaf params");
    params
        .subject_alt_names
        .push(SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    params
}

/// Server certificate issued by a freshly generated CA; the CA is what gets pinned.
pub fn ca_signed() -> Identity {
    let ca_key = KeyPair::generate().expect("ca key");
    let mut ca_params = CertificateParams::new(Vec::<String>::new()).expect("ca params");
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params
        .distinguished_name
        .push(DnType::CommonName, "lnd test authority");
    ca_params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    let ca_cert = ca_params.self_signed(&ca_key).expect("ca cert");

    let key = KeyPair::generate().expect("leaf key");
    let leaf = leaf_params()
        .signed_by(&key, &ca_cert, &ca_key)
        .expect("leaf cert");
    Identity {
        trust_pem: ca_cert.pem(),
        chain: vec![leaf.der().clone()],
        key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
    }
}

/// Self-signed certificate marked `CA:TRUE` and used directly by the server,
/// the way LND generates its `tls.cert`.
pub fn lnd_style_self_signed() -> Identity {
    self_signed_from(leaf_params())
}

/// LND-style certificate whose validity period ended in 2001.
pub fn expired_self_signed() -> Identity {
    let mut params = leaf_params();
    params.not_before = rcgen::date_time_ymd(2000, 1, 1);
    params.not_after = rcgen::date_time_ymd(2001, 1, 1);
    self_signed_from(params)
}

/// LND-style certificate naming only `name`, never the loopback address.
pub fn self_signed_for(name: &str) -> Identity {
    self_signed_from(CertificateParams::new(vec![name.to_string()]).expect("params"))
}

fn self_signed_from(mut params: CertificateParams) -> Identity {
    let key = KeyPair::generate().expect("key");
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
        .distinguished_name
        .push(DnType::OrganizationName, "lnd autogenerated cert");
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    let cert = params.self_signed(&key).expect("cert");
    Identity {
        trust_pem: cert.pem(),
        chain: vec![cert.der().clone()],
        key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
    }
}

fn full(status: StatusCode, body: impl Into<Bytes>) -> Response<ServerBody> {
    let mut res = Response::new(Full::new(body.into()).boxed_unsync());
    *res.status_mut() = status;
    res
}

type Events = Arc<Mutex<Option<mpsc::Receiver<Bytes>>>>;

async fn route(req: Request<Incoming>, events: Events) -> Response<ServerBody> {
    let authorized = req
        .headers()
        .get("grpc-metadata-macaroon")
        .is_some_and(|v| v.as_bytes() == hex::encode(MACAROON).as_bytes());
    if !authorized {
        return full(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":{"code":2,"message":"verification failed: signature mismatch after caveat verification"}}"#,
        );
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    match (method, path.as_str()) {
        (Method::GET, "/v1/getinfo") => full(StatusCode::OK, GETINFO),
        (Method::POST, "/v1/invoices" | "/v2/router/send") => {
            let body = req
                .into_body()
                .collect()
                .await
                .map(|c| c.to_bytes())
                .unwrap_or_default();
            let echo = format!(r#"{{"echo":{}}}"#, String::from_utf8_lossy(&body));
            full(StatusCode::OK, echo)
        }
        (Method::GET, "/v1/balance/channels") => full(StatusCode::INTERNAL_SERVER_ERROR, "0"),
        (Method::GET, "/v1/invoices/subscribe") => {
            let rx = events.lock().expect("events lock").take();
            match rx {
                Some(rx) => {
                    let frames = futures_util::stream::unfold(rx, |mut rx| async move {
                        rx.recv()
                            .await
                            .map(|chunk| (Ok::<_, Infallible>(Frame::data(chunk)), rx))
                    });
                    Response::new(StreamBody::new(frames).boxed_unsync())
                }
                None => full(StatusCode::OK, ""),
            }
        }
        (Method::GET, p) if p.starts_with("/v1/payreq/") => {
            let hash = p.trim_start_matches("/v1/payreq/");
            full(
                StatusCode::OK,
                format!(r#"{{"payment_hash":"{hash}","num_satoshis":"250"}}"#),
            )
        }
        _ => full(StatusCode::NOT_FOUND, r#"{"error":{"message":"Not Found"}}"#),
    }
}

/// Serve HTTPS on an ephemeral localhost port until the test runtime shuts down.
///
/// Chunks sent on the `events` channel are written to the first subscription.
pub async fn spawn_node(identity: Identity, events: Option<mpsc::Receiver<Bytes>>) -> SocketAddr {
    let config = ServerConfig::builder_with_provider(Arc::new(aws_lc_rs::default_provider()))
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_no_client_auth()
        .with_single_cert(identity.chain, identity.key)
        .expect("server identity");
    let acceptor = TlsAcceptor::from(Arc::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let events: Events = Arc::new(Mutex::new(events));

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let events = events.clone();
            tokio::spawn(async move {
                let Ok(tls) = acceptor.accept(tcp).await else {
                    return;
                };
                let service = service_fn(move |req| {
                    let events = events.clone();
                    async move { Ok::<_, Infallible>(route(req, events).await) }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(tls), service)
                    .await;
            });
        }
    });
    addr
}

pub fn host(addr: SocketAddr) -> String {
    format!("https://127.0.0.1:{}", addr.port())
}
