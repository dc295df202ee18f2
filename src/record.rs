use crate::crypto;
use crate::errors;
use crate::fields;
use crate::pack::Pack;

use num_traits::FromPrimitive;
use ring::rand::SecureRandom;
use std::convert::TryFrom;

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct ProtocolVersion {
    pub major: fields::Uint8,
    pub minor: fields::Uint8,
}

impl ProtocolVersion {
    pub fn code(&self) -> u16 {
        ((self.major.0 as u16) << 8) | (self.minor.0 as u16)
    }

    pub fn from_code(code: u16) -> Self {
        Self {
            major: fields::Uint8((code >> 8) as u8),
            minor: fields::Uint8((code & 0xff) as u8),
        }
    }
}

impl Pack for ProtocolVersion {
    fn empty() -> Self {
        Self {
            major: fields::Uint8(0),
            minor: fields::Uint8(0),
        }
    }

    fn pack(&self) -> Vec<u8> {
        vec![self.major.0, self.minor.0]
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        match v.len() {
            0..=1 => Err(errors::TlsError::InvalidLength),
            _ => {
                let rest: Vec<u8> = v.drain(2..).collect();
                self.major = fields::Uint8(v[0]);
                self.minor = fields::Uint8(v[1]);
                Ok(rest)
            }
        }
    }
}

pub const TLS_1_0: ProtocolVersion = ProtocolVersion {
    major: fields::Uint8(3),
    minor: fields::Uint8(1),
};

pub const TLS_1_1: ProtocolVersion = ProtocolVersion {
    major: fields::Uint8(3),
    minor: fields::Uint8(2),
};

pub const TLS_1_2: ProtocolVersion = ProtocolVersion {
    major: fields::Uint8(3),
    minor: fields::Uint8(3),
};

#[derive(Debug, Copy, Clone, Primitive, PartialEq)]
#[repr(u8)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl ContentType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::from_u8(byte)
    }
}

pub const RECORD_HEADER_LEN: usize = 5;
pub const MAX_PLAINTEXT_LEN: usize = 1 << 14;
pub const MAX_CIPHERTEXT_LEN: usize = MAX_PLAINTEXT_LEN + 2048;

/// 5-byte record header. The type octet is kept raw so that records of
/// unknown type can still be reassembled, MAC-checked and then ignored.
#[derive(Clone, Copy, Debug)]
pub struct RecordHeader {
    pub rtype: fields::Uint8,
    pub version: ProtocolVersion,
    pub length: fields::Uint16,
}

impl RecordHeader {
    pub fn new(
        rtype: ContentType,
        version: ProtocolVersion,
        length: usize,
    ) -> Result<Self, errors::TlsError> {
        Ok(Self {
            rtype: fields::Uint8(rtype as u8),
            version,
            length: fields::Uint16(u16::try_from(length)?),
        })
    }

    pub fn content_type(&self) -> Option<ContentType> {
        ContentType::from_byte(self.rtype.0)
    }
}

impl Pack for RecordHeader {
    fn empty() -> Self {
        Self {
            rtype: fields::Uint8(0),
            version: ProtocolVersion::empty(),
            length: fields::Uint16(0),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(RECORD_HEADER_LEN);
        v.extend_from_slice(&self.rtype.pack());
        v.extend_from_slice(&self.version.pack());
        v.extend_from_slice(&self.length.pack());
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.rtype.unpack(v)?;
        let mut v = self.version.unpack(&mut v)?;
        let v = self.length.unpack(&mut v)?;
        Ok(v)
    }
}

/// Record MAC: HMAC over sequence number, header (covering the
/// plaintext length) and payload.
pub fn record_mac(
    digest: crypto::DigestAlgorithm,
    mac_secret: &[u8],
    seq: u64,
    header: &RecordHeader,
    payload: &[u8],
) -> Result<Vec<u8>, errors::TlsError> {
    let seq_bytes = seq.to_be_bytes();
    let header_bytes = header.pack();
    crypto::hmac(digest, mac_secret, &[&seq_bytes, &header_bytes, payload])
}

/// Assemble a stream-ciphered record body: payload || MAC.
pub fn assemble_stream(payload: &[u8], mac: &[u8]) -> Vec<u8> {
    let mut plaintext = Vec::with_capacity(payload.len() + mac.len());
    plaintext.extend_from_slice(payload);
    plaintext.extend_from_slice(mac);
    plaintext
}

/// Assemble a block-ciphered record body:
/// [explicit IV for TLSv1.1 and later] || payload || MAC || padding,
/// where every padding byte (including the trailing length byte)
/// equals the padding length.
pub fn assemble_block(
    rand: &dyn SecureRandom,
    version: ProtocolVersion,
    block_size: usize,
    payload: &[u8],
    mac: &[u8],
) -> Result<Vec<u8>, errors::TlsError> {
    let iv_len = if version >= TLS_1_1 { block_size } else { 0 };
    let unpadded = iv_len + payload.len() + mac.len() + 1;
    let padding_len = (block_size - (unpadded % block_size)) % block_size;

    let mut plaintext = Vec::with_capacity(unpadded + padding_len);
    if iv_len > 0 {
        let mut iv = vec![0u8; iv_len];
        crypto::generate_random(rand, &mut iv)?;
        plaintext.extend_from_slice(&iv);
    }
    plaintext.extend_from_slice(payload);
    plaintext.extend_from_slice(mac);
    plaintext.extend_from_slice(&vec![padding_len as u8; padding_len + 1]);
    Ok(plaintext)
}

/// Split a decrypted stream-ciphered body into content and MAC.
pub fn split_stream(
    mac_len: usize,
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), errors::TlsError> {
    if plaintext.len() < mac_len {
        return Err(errors::TlsError::MalformedRecord("underlength record"));
    }
    let content_len = plaintext.len() - mac_len;
    Ok((
        plaintext[..content_len].to_vec(),
        plaintext[content_len..].to_vec(),
    ))
}

/// Split a decrypted block-ciphered body into content and MAC,
/// stripping the explicit IV (TLSv1.1 and later) and validating the
/// self-describing padding.
pub fn split_block(
    version: ProtocolVersion,
    block_size: usize,
    mac_len: usize,
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), errors::TlsError> {
    if plaintext.is_empty() {
        return Err(errors::TlsError::MalformedRecord("underlength record"));
    }

    let iv_len = if version >= TLS_1_1 { block_size } else { 0 };
    let padding_len = plaintext[plaintext.len() - 1] as usize;
    if plaintext.len() < iv_len + mac_len + padding_len + 1 {
        return Err(errors::TlsError::InvalidPadding);
    }

    let content_len = plaintext.len() - iv_len - mac_len - padding_len - 1;
    let padding = &plaintext[plaintext.len() - padding_len - 1..plaintext.len() - 1];
    if padding.iter().any(|&byte| byte != padding_len as u8) {
        return Err(errors::TlsError::InvalidPadding);
    }

    let content = &plaintext[iv_len..iv_len + content_len];
    let mac = &plaintext[iv_len + content_len..iv_len + content_len + mac_len];
    Ok((content.to_vec(), mac.to_vec()))
}

#[cfg(test)]
mod tests {
    use crate::crypto;
    use crate::errors;
    use crate::fields;
    use crate::pack::Pack;
    use crate::pack_unpack_inverse_test;
    use crate::record;

    use ring::rand;

    pack_unpack_inverse_test!(
        record_header_pack_unpack_inverse_test,
        record::RecordHeader::new(record::ContentType::Handshake, record::TLS_1_2, 77)
            .expect("building RecordHeader failed")
    );

    #[test]
    fn version_ordering() {
        assert!(record::TLS_1_0 < record::TLS_1_1);
        assert!(record::TLS_1_1 < record::TLS_1_2);
        assert!(record::TLS_1_2 < record::ProtocolVersion::from_code(0x0304));
        assert_eq!(record::TLS_1_2.code(), 0x0303);
    }

    #[test]
    fn assemble_then_split_block_explicit_iv() {
        let rand = rand::SystemRandom::new();
        let payload = b"GET / HTTP/1.0\r\n\r\n";
        let mac = [0xaau8; 20];

        let plaintext =
            record::assemble_block(&rand, record::TLS_1_2, 16, payload, &mac).expect("assemble");
        assert_eq!(plaintext.len() % 16, 0);

        let (content, split_mac) =
            record::split_block(record::TLS_1_2, 16, mac.len(), &plaintext).expect("split");
        assert_eq!(content, payload);
        assert_eq!(split_mac, mac);
    }

    #[test]
    fn assemble_then_split_block_implicit_iv() {
        let rand = rand::SystemRandom::new();
        let payload = [0x42u8; 31];
        let mac = [0x17u8; 32];

        let plaintext =
            record::assemble_block(&rand, record::TLS_1_0, 16, &payload, &mac).expect("assemble");
        assert_eq!(plaintext.len() % 16, 0);

        let (content, split_mac) =
            record::split_block(record::TLS_1_0, 16, mac.len(), &plaintext).expect("split");
        assert_eq!(content, payload.to_vec());
        assert_eq!(split_mac, mac.to_vec());
    }

    #[test]
    fn split_block_rejects_overlong_padding_claim() {
        // 64-byte record claiming 255 bytes of padding
        let mut plaintext = vec![0u8; 64];
        plaintext[63] = 255;
        let result = record::split_block(record::TLS_1_2, 16, 20, &plaintext);
        assert!(matches!(result, Err(errors::TlsError::InvalidPadding)));
    }

    #[test]
    fn split_block_rejects_inconsistent_padding_bytes() {
        let rand = rand::SystemRandom::new();
        let mac = [0u8; 20];
        let mut plaintext =
            record::assemble_block(&rand, record::TLS_1_2, 16, b"data", &mac).expect("assemble");
        let len = plaintext.len();
        plaintext[len - 2] ^= 0x01;
        let result = record::split_block(record::TLS_1_2, 16, mac.len(), &plaintext);
        assert!(matches!(result, Err(errors::TlsError::InvalidPadding)));
    }

    #[test]
    fn split_stream_rejects_underlength() {
        let result = record::split_stream(20, &[0u8; 10]);
        assert!(matches!(result, Err(errors::TlsError::MalformedRecord(_))));
    }

    #[test]
    fn record_mac_covers_sequence_number() {
        let header = record::RecordHeader::new(
            record::ContentType::ApplicationData,
            record::TLS_1_2,
            5,
        )
        .expect("header");
        let secret = [0x0bu8; 32];
        let mac0 =
            record::record_mac(crypto::DigestAlgorithm::Sha256, &secret, 0, &header, b"hello")
                .expect("mac");
        let mac1 =
            record::record_mac(crypto::DigestAlgorithm::Sha256, &secret, 1, &header, b"hello")
                .expect("mac");
        assert_eq!(mac0.len(), 32);
        assert_ne!(mac0, mac1);
    }

    #[test]
    fn header_content_type_round_trip() {
        let header =
            record::RecordHeader::new(record::ContentType::Alert, record::TLS_1_1, 2).expect("header");
        assert_eq!(header.content_type(), Some(record::ContentType::Alert));
        assert_eq!(header.rtype, fields::Uint8(21));

        let unknown = record::RecordHeader {
            rtype: fields::Uint8(99),
            version: record::TLS_1_2,
            length: fields::Uint16(0),
        };
        assert_eq!(unknown.content_type(), None);
    }
}
