use crate::errors;
use crate::pubkey::PubkeyAlgorithm;

use x509_parser::certificate::X509Certificate;
use x509_parser::oid_registry::OID_PKCS1_RSAENCRYPTION;
use x509_parser::prelude::FromDer;

/// Identity extracted from a validated certificate chain.
pub struct ServerIdentity {
    /// Leaf SubjectPublicKeyInfo, DER.
    pub public_key_der: Vec<u8>,
}

/// Certificate-chain collaborator. The session hands over the raw DER
/// chain exactly as presented on the wire; the verifier owns clock and
/// trust-anchor policy.
pub trait CertificateVerifier {
    fn verify_chain(
        &self,
        chain: &[Vec<u8>],
        server_name: &str,
        now: i64,
    ) -> Result<ServerIdentity, errors::TlsError>;
}

/// Built-in verifier: parses every certificate, checks validity
/// windows and issuer/subject linkage, and requires the leaf subject
/// common name to equal the expected server name byte for byte.
/// Anchor policy stays with the embedder.
pub struct X509Verifier;

impl CertificateVerifier for X509Verifier {
    fn verify_chain(
        &self,
        chain: &[Vec<u8>],
        server_name: &str,
        now: i64,
    ) -> Result<ServerIdentity, errors::TlsError> {
        if chain.is_empty() {
            return Err(errors::TlsError::IncompleteChain);
        }

        let mut parsed = Vec::with_capacity(chain.len());
        for der in chain {
            let (_, certificate) = X509Certificate::from_der(der)
                .map_err(|_| errors::TlsError::IncompleteChain)?;
            parsed.push(certificate);
        }

        for certificate in &parsed {
            let validity = certificate.validity();
            if now < validity.not_before.timestamp() || now > validity.not_after.timestamp() {
                return Err(errors::TlsError::IncompleteChain);
            }
        }
        for pair in parsed.windows(2) {
            if pair[0].issuer().as_raw() != pair[1].subject().as_raw() {
                return Err(errors::TlsError::IncompleteChain);
            }
        }

        let leaf = &parsed[0];
        let common_name = leaf
            .subject()
            .iter_common_name()
            .next()
            .and_then(|attr| attr.as_str().ok())
            .ok_or(errors::TlsError::WrongName)?;
        if common_name != server_name {
            return Err(errors::TlsError::WrongName);
        }

        Ok(ServerIdentity {
            public_key_der: leaf.public_key().raw.to_vec(),
        })
    }
}

/// Determine the public-key algorithm of a certificate, used to learn
/// what the configured client certificate can sign with.
pub(crate) fn pubkey_algorithm(cert_der: &[u8]) -> Result<PubkeyAlgorithm, errors::TlsError> {
    let (_, certificate) = X509Certificate::from_der(cert_der)
        .map_err(|_| errors::TlsError::CryptoFailure("cannot parse client certificate"))?;
    if certificate.public_key().algorithm.algorithm == OID_PKCS1_RSAENCRYPTION {
        Ok(PubkeyAlgorithm::Rsa)
    } else {
        Err(errors::TlsError::SignatureHashNotSupported)
    }
}
