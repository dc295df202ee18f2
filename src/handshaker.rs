use crate::errors;
use crate::extensions;
use crate::handshake;
use crate::record;
use crate::suites;

pub fn client_hello(
    version: record::ProtocolVersion,
    random: handshake::Random,
    server_name: &str,
) -> Result<handshake::Handshake<handshake::ClientHello>, errors::TlsError> {
    let session_id = handshake::SessionId::new(Vec::new())?;
    let cipher_suites = handshake::CipherSuites::new(suites::advertised_codes())?;
    let compression_methods =
        handshake::CompressionMethods::new(vec![handshake::CompressionMethod::Null])?;
    let extensions =
        extensions::ExtensionList::new(vec![extensions::Extension::server_name(server_name)?])?;

    let client_hello = handshake::ClientHello {
        client_version: version,
        random,
        session_id,
        cipher_suites,
        compression_methods,
        extensions,
    };
    handshake::Handshake::new(client_hello)
}

/// Certificate message with zero or one entries; the client never
/// sends a chain.
pub fn certificate(
    client_certificate: Option<&[u8]>,
) -> Result<handshake::Handshake<handshake::Certificates>, errors::TlsError> {
    let certificates = match client_certificate {
        Some(der) => vec![handshake::Certificate::new(der.to_vec())?],
        None => Vec::new(),
    };
    handshake::Handshake::new(handshake::Certificates::new(certificates)?)
}

pub fn client_key_exchange(
    encrypted_pre_master_secret: Vec<u8>,
) -> Result<handshake::Handshake<handshake::ClientKeyExchange>, errors::TlsError> {
    handshake::Handshake::new(handshake::ClientKeyExchange::new(
        encrypted_pre_master_secret,
    )?)
}

pub fn certificate_verify(
    sig_hash: Option<handshake::SignatureHashId>,
    signature: Vec<u8>,
) -> Result<handshake::Handshake<handshake::CertificateVerify>, errors::TlsError> {
    handshake::Handshake::new(handshake::CertificateVerify::new(sig_hash, signature)?)
}

pub fn finished(
    verify_data: Vec<u8>,
) -> Result<handshake::Handshake<handshake::Finished>, errors::TlsError> {
    handshake::Handshake::new(handshake::Finished::new(verify_data))
}
