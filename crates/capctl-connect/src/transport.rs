//! Transport selection and channel establishment for node connections

use hyper_util::rt::TokioIo;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;
use tracing::debug;

use crate::error::{ControlError, Result};

/// How node connections are secured.
///
/// There is no middle ground: either plaintext HTTP/2, or TLS that accepts
/// any server certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    #[default]
    Plaintext,
    TlsSkipVerify,
}

impl Transport {
    pub fn from_secure_flag(secure: bool) -> Self {
        if secure {
            Transport::TlsSkipVerify
        } else {
            Transport::Plaintext
        }
    }
}

/// Dial settings applied to every node endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            tcp_keepalive: Some(Duration::from_secs(30)),
        }
    }
}

/// Build an endpoint for `address`, which may be `host:port` or carry an
/// `http://`/`https://` scheme.
///
/// The endpoint URI is always `http://`; TLS, when selected, is layered by
/// our own connector.
pub(crate) fn endpoint_for(address: &str, options: &ConnectOptions) -> Result<Endpoint> {
    let trimmed = address.trim();
    let authority = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    if authority.is_empty() || authority.contains("://") {
        return Err(ControlError::InvalidAddress {
            address: address.to_string(),
            reason: "expected host:port".to_string(),
        });
    }

    let endpoint = Endpoint::from_shared(format!("http://{}", authority)).map_err(|e| {
        ControlError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })?;

    if endpoint.uri().host().is_none() {
        return Err(ControlError::InvalidAddress {
            address: address.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(endpoint
        .connect_timeout(options.connect_timeout)
        .tcp_keepalive(options.tcp_keepalive))
}

/// Dial one node and return a ready channel.
pub async fn connect(
    address: &str,
    transport: Transport,
    options: &ConnectOptions,
) -> Result<Channel> {
    let endpoint = endpoint_for(address, options)?;

    debug!(node = %address, ?transport, "Dialing node");

    let connected = match transport {
        Transport::Plaintext => endpoint.connect().await,
        Transport::TlsSkipVerify => {
            let connector = TlsConnector::from(Arc::new(insecure_client_config()?));
            endpoint
                .connect_with_connector(service_fn(move |uri: Uri| {
                    let connector = connector.clone();
                    async move {
                        let host = uri
                            .host()
                            .ok_or_else(|| {
                                io::Error::new(io::ErrorKind::InvalidInput, "missing host")
                            })?
                            .trim_start_matches('[')
                            .trim_end_matches(']')
                            .to_string();
                        let port = uri.port_u16().unwrap_or(443);

                        let tcp = TcpStream::connect((host.as_str(), port)).await?;
                        let server_name = ServerName::try_from(host)
                            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
                        let tls = connector.connect(server_name, tcp).await?;

                        Ok::<_, io::Error>(TokioIo::new(tls))
                    }
                }))
                .await
        }
    };

    connected.map_err(|source| ControlError::Connection {
        address: address.to_string(),
        source,
    })
}

fn insecure_client_config() -> Result<rustls::ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut config = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"h2".to_vec()];

    Ok(config)
}

/// Accepts every server certificate; handshake signatures are still checked.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
