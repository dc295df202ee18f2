use crate::crypto::DigestAlgorithm;
use crate::errors;

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PubkeyAlgorithm {
    Null,
    Rsa,
}

/// Public-key context owned by a cipher spec while the suite holds the
/// server key. The key is installed once the server Certificate has
/// been validated.
#[derive(Clone)]
pub enum PubkeyContext {
    Null,
    Rsa(Option<RsaPublicKey>),
}

impl PubkeyContext {
    pub fn new(algorithm: PubkeyAlgorithm) -> Self {
        match algorithm {
            PubkeyAlgorithm::Null => PubkeyContext::Null,
            PubkeyAlgorithm::Rsa => PubkeyContext::Rsa(None),
        }
    }

    /// Install a peer public key from DER, accepting either a PKCS#1
    /// RSAPublicKey or a complete SubjectPublicKeyInfo.
    pub fn init(&mut self, der: &[u8]) -> Result<(), errors::TlsError> {
        match self {
            PubkeyContext::Null => Err(errors::TlsError::CryptoFailure(
                "null public-key context cannot hold a key",
            )),
            PubkeyContext::Rsa(slot) => {
                let key = RsaPublicKey::from_pkcs1_der(der)
                    .ok()
                    .or_else(|| RsaPublicKey::from_public_key_der(der).ok())
                    .ok_or(errors::TlsError::CryptoFailure(
                        "cannot parse RSA public key",
                    ))?;
                *slot = Some(key);
                Ok(())
            }
        }
    }

    /// Maximum output length of the public-key operation (the modulus
    /// size for RSA). Zero until a key is installed.
    pub fn max_len(&self) -> usize {
        match self {
            PubkeyContext::Rsa(Some(key)) => key.size(),
            _ => 0,
        }
    }

    /// RSA PKCS#1 v1.5 encryption under the installed peer key.
    pub fn encrypt(&self, msg: &[u8]) -> Result<Vec<u8>, errors::TlsError> {
        match self {
            PubkeyContext::Rsa(Some(key)) => key
                .encrypt(&mut OsRng, Pkcs1v15Encrypt, msg)
                .map_err(|_| errors::TlsError::CryptoFailure("RSA encryption failed")),
            _ => Err(errors::TlsError::CryptoFailure(
                "no public key installed",
            )),
        }
    }
}

/// Sign a handshake transcript digest with the client private key
/// (PKCS#1 or PKCS#8 DER). TLSv1.2 signatures carry the SHA-256
/// digestInfo; MD5+SHA1 signatures carry none.
pub fn sign_digest(
    key_der: &[u8],
    digest_algorithm: DigestAlgorithm,
    digest: &[u8],
) -> Result<Vec<u8>, errors::TlsError> {
    let key = RsaPrivateKey::from_pkcs1_der(key_der)
        .ok()
        .or_else(|| RsaPrivateKey::from_pkcs8_der(key_der).ok())
        .ok_or(errors::TlsError::CryptoFailure(
            "cannot parse RSA private key",
        ))?;

    let padding = match digest_algorithm {
        DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        DigestAlgorithm::Md5Sha1 => Pkcs1v15Sign::new_unprefixed(),
        _ => return Err(errors::TlsError::SignatureHashNotSupported),
    };

    key.sign(padding, digest)
        .map_err(|_| errors::TlsError::CryptoFailure("RSA signing failed"))
}

#[cfg(test)]
mod tests {
    use crate::crypto::DigestAlgorithm;
    use crate::pubkey::{self, PubkeyAlgorithm, PubkeyContext};

    use rsa::pkcs1::EncodeRsaPrivateKey;
    use rsa::pkcs8::EncodePublicKey;
    use rsa::rand_core::OsRng;
    use rsa::traits::PublicKeyParts;
    use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

    fn test_key() -> RsaPrivateKey {
        RsaPrivateKey::new(&mut OsRng, 2048).expect("RSA key generation failed")
    }

    #[test]
    fn encrypt_round_trips_through_private_key() {
        let private = test_key();
        let public = RsaPublicKey::from(&private);
        let spki = public
            .to_public_key_der()
            .expect("SPKI encoding failed");

        let mut ctx = PubkeyContext::new(PubkeyAlgorithm::Rsa);
        ctx.init(spki.as_bytes()).expect("key install failed");
        assert_eq!(ctx.max_len(), public.size());

        let pre_master = [0x47u8; 48];
        let encrypted = ctx.encrypt(&pre_master).expect("encrypt failed");
        assert_eq!(encrypted.len(), public.size());

        let decrypted = private
            .decrypt(Pkcs1v15Encrypt, &encrypted)
            .expect("decrypt failed");
        assert_eq!(decrypted, pre_master.to_vec());
    }

    #[test]
    fn sign_digest_produces_modulus_sized_signatures() {
        let private = test_key();
        let der = private.to_pkcs1_der().expect("PKCS#1 encoding failed");

        let digest = [0x11u8; 32];
        let signature =
            pubkey::sign_digest(der.as_bytes(), DigestAlgorithm::Sha256, &digest)
                .expect("signing failed");
        assert_eq!(signature.len(), private.size());

        let hybrid = [0x22u8; 36];
        let signature =
            pubkey::sign_digest(der.as_bytes(), DigestAlgorithm::Md5Sha1, &hybrid)
                .expect("signing failed");
        assert_eq!(signature.len(), private.size());
    }

    #[test]
    fn null_context_refuses_keys() {
        let mut ctx = PubkeyContext::new(PubkeyAlgorithm::Null);
        assert!(ctx.init(&[0x30, 0x00]).is_err());
        assert_eq!(ctx.max_len(), 0);
        assert!(ctx.encrypt(&[0u8; 4]).is_err());
    }
}
