use crate::cipher::CipherAlgorithm;
use crate::crypto::DigestAlgorithm;
use crate::fields;
use crate::pubkey::PubkeyAlgorithm;

pub type CipherSuiteCode = fields::Uint16;

pub const TLS_RSA_WITH_AES_256_CBC_SHA256: CipherSuiteCode = fields::Uint16(0x003d);
pub const TLS_RSA_WITH_AES_128_CBC_SHA256: CipherSuiteCode = fields::Uint16(0x003c);
pub const TLS_RSA_WITH_AES_256_CBC_SHA: CipherSuiteCode = fields::Uint16(0x0035);
pub const TLS_RSA_WITH_AES_128_CBC_SHA: CipherSuiteCode = fields::Uint16(0x002f);

#[derive(Debug)]
pub struct CipherSuite {
    pub code: CipherSuiteCode,
    pub pubkey: PubkeyAlgorithm,
    pub cipher: CipherAlgorithm,
    pub digest: DigestAlgorithm,
}

impl CipherSuite {
    pub fn key_len(&self) -> usize {
        self.cipher.key_len()
    }

    pub fn mac_len(&self) -> usize {
        self.digest.digest_size()
    }
}

/// Null cipher suite: the identity sentinel for "no cipher negotiated
/// yet". Must never be activated for protecting data.
pub static NULL_CIPHER_SUITE: CipherSuite = CipherSuite {
    code: fields::Uint16(0x0000),
    pubkey: PubkeyAlgorithm::Null,
    cipher: CipherAlgorithm::Null,
    digest: DigestAlgorithm::Null,
};

/// Supported cipher suites, in order of preference.
pub static CIPHER_SUITES: [CipherSuite; 4] = [
    CipherSuite {
        code: TLS_RSA_WITH_AES_256_CBC_SHA256,
        pubkey: PubkeyAlgorithm::Rsa,
        cipher: CipherAlgorithm::Aes256Cbc,
        digest: DigestAlgorithm::Sha256,
    },
    CipherSuite {
        code: TLS_RSA_WITH_AES_128_CBC_SHA256,
        pubkey: PubkeyAlgorithm::Rsa,
        cipher: CipherAlgorithm::Aes128Cbc,
        digest: DigestAlgorithm::Sha256,
    },
    CipherSuite {
        code: TLS_RSA_WITH_AES_256_CBC_SHA,
        pubkey: PubkeyAlgorithm::Rsa,
        cipher: CipherAlgorithm::Aes256Cbc,
        digest: DigestAlgorithm::Sha1,
    },
    CipherSuite {
        code: TLS_RSA_WITH_AES_128_CBC_SHA,
        pubkey: PubkeyAlgorithm::Rsa,
        cipher: CipherAlgorithm::Aes128Cbc,
        digest: DigestAlgorithm::Sha1,
    },
];

pub fn find(code: CipherSuiteCode) -> Option<&'static CipherSuite> {
    CIPHER_SUITES.iter().find(|suite| suite.code == code)
}

pub fn advertised_codes() -> Vec<fields::Uint16> {
    CIPHER_SUITES.iter().map(|suite| suite.code).collect()
}

#[cfg(test)]
mod tests {
    use crate::fields;
    use crate::suites;

    #[test]
    fn find_known_and_unknown_codes() {
        let suite = suites::find(suites::TLS_RSA_WITH_AES_128_CBC_SHA).expect("suite not found");
        assert_eq!(suite.key_len(), 16);
        assert_eq!(suite.mac_len(), 20);
        assert!(suites::find(fields::Uint16(0xc014)).is_none());
    }

    #[test]
    fn advertisement_preserves_preference_order() {
        assert_eq!(
            suites::advertised_codes(),
            vec![
                fields::Uint16(0x003d),
                fields::Uint16(0x003c),
                fields::Uint16(0x0035),
                fields::Uint16(0x002f),
            ]
        );
    }
}
