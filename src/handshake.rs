use crate::crypto;
use crate::errors;
use crate::extensions;
use crate::fields;
use crate::pack::Pack;
use crate::record;

use num_traits::FromPrimitive;
use ring::rand::SecureRandom;
use std::convert::TryFrom;
use std::time::SystemTime;

#[derive(Debug, Copy, Clone, PartialEq, Primitive)]
#[repr(u8)]
pub enum HandshakeType {
    HelloRequest = 0,
    ClientHello = 1,
    ServerHello = 2,
    Certificates = 11, // made plural because the Certificate message is actually a list
    ServerKeyExchange = 12,
    CertificateRequest = 13,
    ServerHelloDone = 14,
    CertificateVerify = 15,
    ClientKeyExchange = 16,
    Finished = 20,
}

impl Pack for HandshakeType {
    fn empty() -> Self {
        HandshakeType::HelloRequest
    }

    fn pack(&self) -> Vec<u8> {
        vec![*self as u8]
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        match v.len() {
            0 => Err(errors::TlsError::InvalidLength),
            _ => {
                let rest: Vec<u8> = v.drain(1..).collect();
                *self = Self::from_u8(v[0]).ok_or(errors::TlsError::InvalidLength)?;
                Ok(rest)
            }
        }
    }
}

pub trait ValidMessage {
    fn into_handshake_type() -> HandshakeType;
}

macro_rules! new_handshake_trait {
    ($name: ident) => {
        impl ValidMessage for $name {
            fn into_handshake_type() -> HandshakeType {
                HandshakeType::$name
            }
        }
    };
}
// Ensures we can statically pack/unpack valid Handshake messages
new_handshake_trait!(ClientHello);
new_handshake_trait!(ServerHello);
new_handshake_trait!(Certificates);
new_handshake_trait!(ServerHelloDone);
new_handshake_trait!(CertificateVerify);
new_handshake_trait!(ClientKeyExchange);
new_handshake_trait!(Finished);

pub type Length = fields::Uint24;

/// Handshake message prefix: one type byte and a 24-bit body length.
pub const HANDSHAKE_PREFIX_LEN: usize = 4;

#[derive(Clone, Debug)]
pub struct Handshake<Body>
where
    Body: ValidMessage + Pack,
{
    pub msg_type: HandshakeType,
    pub length: Length,
    pub body: Body,
}

impl<Body> Handshake<Body>
where
    Body: ValidMessage + Pack,
{
    pub fn new(body: Body) -> Result<Handshake<Body>, errors::TlsError> {
        let length = fields::uint24_from_usize(body.len())?;
        Ok(Self {
            msg_type: Body::into_handshake_type(),
            length,
            body,
        })
    }
}

impl<Body> Pack for Handshake<Body>
where
    Body: ValidMessage + Pack,
{
    fn empty() -> Self {
        Self {
            msg_type: HandshakeType::empty(),
            length: Length::empty(),
            body: Body::empty(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.msg_type.pack());
        v.extend_from_slice(&self.length.pack());
        v.extend_from_slice(&self.body.pack());
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.msg_type.unpack(v)?;
        let mut v = self.length.unpack(&mut v)?;
        let v = self.body.unpack(&mut v)?;
        Ok(v)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Random {
    gmt_unix_time: fields::Uint32,
    random_bytes: fields::Random,
}

impl Random {
    pub fn new(rand: &dyn SecureRandom) -> Result<Random, errors::TlsError> {
        let mut random_bytes: [u8; 28] = [0; 28];
        rand.fill(&mut random_bytes)
            .map_err(|_| errors::TlsError::CryptoFailure("random generation failed"))?;

        let gmt_unix_time = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?;
        let gmt_unix_time = u32::try_from(gmt_unix_time.as_secs())?;
        Ok(Random {
            gmt_unix_time: fields::Uint32(gmt_unix_time),
            random_bytes: fields::Random(random_bytes),
        })
    }
}

impl Pack for Random {
    fn empty() -> Self {
        Self {
            gmt_unix_time: fields::Uint32::empty(),
            random_bytes: fields::Random::empty(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.gmt_unix_time.pack());
        v.extend_from_slice(&self.random_bytes.pack());
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        match v.len() {
            0..=31 => Err(errors::TlsError::InvalidLength), // uint32 + Random = 4 + 28 = 32
            _ => {
                let rest: Vec<u8> = v.drain(32..).collect();
                let mut v = self.gmt_unix_time.unpack(v)?;
                let _ = self.random_bytes.unpack(&mut v)?;
                Ok(rest)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionId {
    length: fields::Uint8,
    session_id: Vec<u8>,
}

impl SessionId {
    pub fn new(v: Vec<u8>) -> Result<Self, errors::TlsError> {
        Ok(Self {
            length: fields::Uint8(u8::try_from(v.len())?),
            session_id: v,
        })
    }
}

impl Pack for SessionId {
    fn empty() -> Self {
        Self {
            length: fields::Uint8::empty(),
            session_id: Vec::new(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.length.pack());
        v.extend_from_slice(&self.session_id);
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.length.unpack(v)?;
        let length = self.length.0 as usize;
        if v.len() < length {
            return Err(errors::TlsError::InvalidLength);
        }
        let rest: Vec<u8> = v.drain(length..).collect();
        self.session_id = v;
        Ok(rest)
    }
}

pub type CipherSuiteCode = fields::Uint16;

#[derive(Clone, Debug)]
pub struct CipherSuites {
    length: fields::Uint16,
    cipher_suites: Vec<CipherSuiteCode>,
}

impl CipherSuites {
    pub fn new(cipher_suites: Vec<fields::Uint16>) -> Result<CipherSuites, errors::TlsError> {
        let length = u16::try_from(cipher_suites.len() * 2)?;
        Ok(CipherSuites {
            length: fields::Uint16(length),
            cipher_suites,
        })
    }
}

impl Pack for CipherSuites {
    fn empty() -> Self {
        Self {
            length: fields::Uint16::empty(),
            cipher_suites: Vec::new(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.length.pack());
        for code in &self.cipher_suites {
            v.extend_from_slice(&code.pack());
        }
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.length.unpack(v)?;
        let length = self.length.0 as usize;
        if v.len() < length || length % 2 != 0 {
            return Err(errors::TlsError::InvalidLength);
        }
        let rest: Vec<u8> = v.drain(length..).collect();
        self.cipher_suites = v
            .chunks_exact(2)
            .map(|pair| fields::Uint16(u16::from_be_bytes([pair[0], pair[1]])))
            .collect();
        Ok(rest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Primitive)]
#[repr(u8)]
pub enum CompressionMethod {
    Null = 0,
}

#[derive(Clone, Debug)]
pub struct CompressionMethods {
    length: fields::Uint8,
    compression_methods: Vec<CompressionMethod>,
}

impl CompressionMethods {
    pub fn new(compression_methods: Vec<CompressionMethod>) -> Result<Self, errors::TlsError> {
        let length = u8::try_from(compression_methods.len())?;
        Ok(CompressionMethods {
            length: fields::Uint8(length),
            compression_methods,
        })
    }
}

impl Pack for CompressionMethods {
    fn empty() -> Self {
        Self {
            length: fields::Uint8::empty(),
            compression_methods: Vec::new(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.length.pack());
        for method in &self.compression_methods {
            v.push(*method as u8);
        }
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.length.unpack(v)?;
        let length = self.length.0 as usize;
        if v.len() < length {
            return Err(errors::TlsError::InvalidLength);
        }
        let rest: Vec<u8> = v.drain(length..).collect();
        self.compression_methods = v
            .into_iter()
            .map(|byte| {
                CompressionMethod::from_u8(byte).ok_or(errors::TlsError::MalformedRecord(
                    "unknown compression method",
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rest)
    }
}

//
// Handshake messages
//

#[derive(Clone, Debug)]
pub struct ClientHello {
    pub client_version: record::ProtocolVersion,
    pub random: Random,
    pub session_id: SessionId,
    pub cipher_suites: CipherSuites,
    pub compression_methods: CompressionMethods,
    pub extensions: extensions::ExtensionList,
}

impl Pack for ClientHello {
    fn empty() -> Self {
        Self {
            client_version: record::ProtocolVersion::empty(),
            random: Random::empty(),
            session_id: SessionId::empty(),
            cipher_suites: CipherSuites::empty(),
            compression_methods: CompressionMethods::empty(),
            extensions: extensions::ExtensionList::empty(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.client_version.pack());
        v.extend_from_slice(&self.random.pack());
        v.extend_from_slice(&self.session_id.pack());
        v.extend_from_slice(&self.cipher_suites.pack());
        v.extend_from_slice(&self.compression_methods.pack());
        v.extend_from_slice(&self.extensions.pack());
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.client_version.unpack(v)?;
        let mut v = self.random.unpack(&mut v)?;
        let mut v = self.session_id.unpack(&mut v)?;
        let mut v = self.cipher_suites.unpack(&mut v)?;
        let mut v = self.compression_methods.unpack(&mut v)?;
        let v = self.extensions.unpack(&mut v)?;
        Ok(v)
    }
}

#[derive(Clone, Debug)]
pub struct ServerHello {
    pub server_version: record::ProtocolVersion,
    pub random: Random,
    pub session_id: SessionId,
    pub cipher_suite: CipherSuiteCode,
    pub compression_method: CompressionMethod,
}

impl Pack for ServerHello {
    fn empty() -> Self {
        Self {
            server_version: record::ProtocolVersion::empty(),
            random: Random::empty(),
            session_id: SessionId::empty(),
            cipher_suite: fields::Uint16(0),
            compression_method: CompressionMethod::Null,
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.server_version.pack());
        v.extend_from_slice(&self.random.pack());
        v.extend_from_slice(&self.session_id.pack());
        v.extend_from_slice(&self.cipher_suite.pack());
        v.push(self.compression_method as u8);
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.server_version.unpack(v)?;
        let mut v = self.random.unpack(&mut v)?;
        let mut v = self.session_id.unpack(&mut v)?;
        let mut v = self.cipher_suite.unpack(&mut v)?;

        if v.is_empty() {
            return Err(errors::TlsError::InvalidLength);
        }
        self.compression_method = CompressionMethod::from_u8(v[0]).ok_or(
            errors::TlsError::MalformedRecord("unknown compression method"),
        )?;
        // Any remaining bytes are extensions, which we do not use
        Ok(Vec::new())
    }
}

#[derive(Clone, Debug)]
pub struct Certificate {
    pub length: fields::Uint24,
    pub certificate: Vec<u8>,
}

impl Certificate {
    pub fn new(certificate: Vec<u8>) -> Result<Self, errors::TlsError> {
        Ok(Self {
            length: fields::uint24_from_usize(certificate.len())?,
            certificate,
        })
    }
}

impl Pack for Certificate {
    fn empty() -> Self {
        Self {
            length: fields::Uint24::empty(),
            certificate: Vec::new(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.length.pack());
        v.extend_from_slice(&self.certificate);
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.length.unpack(v)?;
        let length = fields::uint24_to_usize(self.length);
        if v.len() < length {
            return Err(errors::TlsError::InvalidLength);
        }
        let rest: Vec<u8> = v.drain(length..).collect();
        self.certificate = v;
        Ok(rest)
    }
}

/// Certificate message: a 24-bit total length followed by zero or more
/// length-prefixed DER certificates. The client never sends more than
/// one entry.
#[derive(Clone, Debug)]
pub struct Certificates {
    pub length: fields::Uint24,
    pub certificates: Vec<Certificate>,
}

impl Certificates {
    pub fn new(certificates: Vec<Certificate>) -> Result<Self, errors::TlsError> {
        let total: usize = certificates.iter().map(|c| c.len()).sum();
        Ok(Self {
            length: fields::uint24_from_usize(total)?,
            certificates,
        })
    }
}

impl Pack for Certificates {
    fn empty() -> Self {
        Self {
            length: fields::Uint24::empty(),
            certificates: Vec::new(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.length.pack());
        for certificate in &self.certificates {
            v.extend_from_slice(&certificate.pack());
        }
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.length.unpack(v)?;
        let length = fields::uint24_to_usize(self.length);
        if v.len() < length {
            return Err(errors::TlsError::InvalidLength);
        }
        let rest: Vec<u8> = v.drain(length..).collect();

        self.certificates = Vec::new();
        while !v.is_empty() {
            let mut certificate = Certificate::empty();
            v = certificate.unpack(&mut v)?;
            self.certificates.push(certificate);
        }
        Ok(rest)
    }
}

#[derive(Clone, Debug)]
pub struct ServerHelloDone;

impl Pack for ServerHelloDone {
    fn empty() -> Self {
        ServerHelloDone {}
    }

    fn pack(&self) -> Vec<u8> {
        Vec::new()
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        Ok(v.to_vec())
    }
}

/// RSA ClientKeyExchange: the pre-master secret encrypted under the
/// server public key, with a 16-bit length prefix.
#[derive(Clone, Debug)]
pub struct ClientKeyExchange {
    pub length: fields::Uint16,
    pub encrypted_pre_master_secret: Vec<u8>,
}

impl ClientKeyExchange {
    pub fn new(encrypted_pre_master_secret: Vec<u8>) -> Result<Self, errors::TlsError> {
        Ok(Self {
            length: fields::Uint16(u16::try_from(encrypted_pre_master_secret.len())?),
            encrypted_pre_master_secret,
        })
    }
}

impl Pack for ClientKeyExchange {
    fn empty() -> Self {
        Self {
            length: fields::Uint16::empty(),
            encrypted_pre_master_secret: Vec::new(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.length.pack());
        v.extend_from_slice(&self.encrypted_pre_master_secret);
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.length.unpack(v)?;
        let length = self.length.0 as usize;
        if v.len() < length {
            return Err(errors::TlsError::InvalidLength);
        }
        let rest: Vec<u8> = v.drain(length..).collect();
        self.encrypted_pre_master_secret = v;
        Ok(rest)
    }
}

pub const TLS_HASH_SHA256: u8 = 4;
pub const TLS_SIGNATURE_RSA: u8 = 1;

/// Explicit signature and hash algorithm pair used by TLSv1.2 and
/// later. Hash algorithm first on the wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignatureHashId {
    pub hash: fields::Uint8,
    pub signature: fields::Uint8,
}

pub const RSA_SHA256_SIGNATURE: SignatureHashId = SignatureHashId {
    hash: fields::Uint8(TLS_HASH_SHA256),
    signature: fields::Uint8(TLS_SIGNATURE_RSA),
};

impl Pack for SignatureHashId {
    fn empty() -> Self {
        Self {
            hash: fields::Uint8(0),
            signature: fields::Uint8(0),
        }
    }

    fn pack(&self) -> Vec<u8> {
        vec![self.hash.0, self.signature.0]
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.hash.unpack(v)?;
        let v = self.signature.unpack(&mut v)?;
        Ok(v)
    }
}

/// CertificateVerify: a signature over the handshake transcript
/// digest, preceded by the algorithm pair for TLSv1.2 and later.
#[derive(Clone, Debug)]
pub struct CertificateVerify {
    pub sig_hash: Option<SignatureHashId>,
    pub length: fields::Uint16,
    pub signature: Vec<u8>,
}

impl CertificateVerify {
    pub fn new(
        sig_hash: Option<SignatureHashId>,
        signature: Vec<u8>,
    ) -> Result<Self, errors::TlsError> {
        Ok(Self {
            sig_hash,
            length: fields::Uint16(u16::try_from(signature.len())?),
            signature,
        })
    }
}

impl Pack for CertificateVerify {
    fn empty() -> Self {
        Self {
            sig_hash: None,
            length: fields::Uint16::empty(),
            signature: Vec::new(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        if let Some(sig_hash) = &self.sig_hash {
            v.extend_from_slice(&sig_hash.pack());
        }
        v.extend_from_slice(&self.length.pack());
        v.extend_from_slice(&self.signature);
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        // The algorithm-pair prefix is version-dependent; disambiguate
        // by checking which interpretation matches the body length.
        if v.len() >= 2 {
            let bare_len = u16::from_be_bytes([v[0], v[1]]) as usize;
            if v.len() == 2 + bare_len {
                self.sig_hash = None;
                let mut v = self.length.unpack(v)?;
                let rest: Vec<u8> = v.drain(bare_len..).collect();
                self.signature = v;
                return Ok(rest);
            }
        }
        if v.len() >= 4 {
            let mut sig_hash = SignatureHashId::empty();
            let mut v = sig_hash.unpack(v)?;
            self.sig_hash = Some(sig_hash);
            let mut v = self.length.unpack(&mut v)?;
            let length = self.length.0 as usize;
            if v.len() < length {
                return Err(errors::TlsError::InvalidLength);
            }
            let rest: Vec<u8> = v.drain(length..).collect();
            self.signature = v;
            return Ok(rest);
        }
        Err(errors::TlsError::InvalidLength)
    }
}

pub const CLIENT_FINISHED_LABEL: &[u8; 15] = b"client finished";
pub const SERVER_FINISHED_LABEL: &[u8; 15] = b"server finished";

#[derive(Clone, Debug)]
pub struct Finished {
    pub verify_data: Vec<u8>,
}

impl Finished {
    pub fn new(verify_data: Vec<u8>) -> Self {
        Self { verify_data }
    }
}

impl Pack for Finished {
    fn empty() -> Self {
        Self {
            verify_data: Vec::new(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        self.verify_data.clone()
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        if v.len() < crypto::VERIFY_DATA_LENGTH {
            return Err(errors::TlsError::InvalidLength);
        }
        let rest: Vec<u8> = v.drain(crypto::VERIFY_DATA_LENGTH..).collect();
        self.verify_data = v.to_vec();
        Ok(rest)
    }
}

#[cfg(test)]
mod tests {
    use crate::handshake;
    use crate::pack::Pack;
    use crate::pack_unpack_inverse_test;
    use crate::record;
    use crate::suites;

    use hex;
    use ring::rand;

    pack_unpack_inverse_test!(
        random_pack_unpack_inverse_test,
        handshake::Random::new(&rand::SystemRandom::new()).expect("building Random failed")
    );

    pack_unpack_inverse_test!(
        session_id_pack_unpack_inverse_test,
        handshake::SessionId::new(vec![1, 2, 3]).expect("building SessionId failed")
    );

    pack_unpack_inverse_test!(
        cipher_suites_pack_unpack_inverse_test,
        handshake::CipherSuites::new(suites::advertised_codes())
            .expect("building CipherSuites failed")
    );

    pack_unpack_inverse_test!(
        compression_methods_pack_unpack_inverse_test,
        handshake::CompressionMethods::new(vec![handshake::CompressionMethod::Null])
            .expect("building CompressionMethods failed")
    );

    pack_unpack_inverse_test!(
        certificates_pack_unpack_inverse_test,
        handshake::Certificates::new(vec![
            handshake::Certificate::new(vec![0x30, 0x82, 0x01, 0x02]).expect("certificate failed")
        ])
        .expect("building Certificates failed")
    );

    pack_unpack_inverse_test!(
        client_key_exchange_pack_unpack_inverse_test,
        handshake::Handshake::new(
            handshake::ClientKeyExchange::new(vec![0xaa; 256]).expect("building CKE failed")
        )
        .expect("building Handshake failed")
    );

    pack_unpack_inverse_test!(
        certificate_verify_with_algorithms_pack_unpack_inverse_test,
        handshake::CertificateVerify::new(
            Some(handshake::RSA_SHA256_SIGNATURE),
            vec![0xbb; 128]
        )
        .expect("building CertificateVerify failed")
    );

    pack_unpack_inverse_test!(
        certificate_verify_bare_pack_unpack_inverse_test,
        handshake::CertificateVerify::new(None, vec![0xcc; 128])
            .expect("building CertificateVerify failed")
    );

    pack_unpack_inverse_test!(
        finished_pack_unpack_inverse_test,
        handshake::Handshake::new(handshake::Finished::new(vec![0x0f; 12]))
            .expect("building Handshake failed")
    );

    #[test]
    fn server_hello_unpack_discards_extensions() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0x03, 0x03]); // TLS 1.2
        bytes.extend_from_slice(&[0x11; 32]); // random
        bytes.push(0); // empty session id
        bytes.extend_from_slice(&[0x00, 0x3c]); // cipher suite
        bytes.push(0); // null compression
        bytes.extend_from_slice(&hex::decode("000500ff01000100").expect("decode failed"));

        let mut server_hello = handshake::ServerHello::empty();
        let rest = server_hello.unpack(&mut bytes).expect("unpack failed");
        assert!(rest.is_empty());
        assert_eq!(server_hello.server_version, record::TLS_1_2);
        assert_eq!(server_hello.cipher_suite.0, 0x003c);
        assert_eq!(server_hello.random.pack()[4..], [0x11; 28]);
    }

    #[test]
    fn client_hello_handshake_prefix() {
        let client_hello = crate::handshaker::client_hello(
            record::TLS_1_2,
            handshake::Random::new(&rand::SystemRandom::new()).expect("random failed"),
            "example.com",
        )
        .expect("building ClientHello failed");
        let bytes = client_hello.pack();
        assert_eq!(bytes[0], handshake::HandshakeType::ClientHello as u8);
        let body_len = ((bytes[1] as usize) << 16) | ((bytes[2] as usize) << 8) | bytes[3] as usize;
        assert_eq!(body_len, bytes.len() - handshake::HANDSHAKE_PREFIX_LEN);
    }

    #[test]
    fn certificates_unpack_rejects_overlength_entry() {
        // Total length 4 but the single entry claims 200 bytes
        let mut bytes = vec![0x00, 0x00, 0x04, 0x00, 0x00, 0xc8, 0xde];
        let mut certificates = handshake::Certificates::empty();
        assert!(certificates.unpack(&mut bytes).is_err());
    }
}
