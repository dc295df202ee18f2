use crate::cipher::CipherContext;
use crate::errors;
use crate::pubkey::PubkeyContext;
use crate::suites::{CipherSuite, NULL_CIPHER_SUITE};

use zeroize::Zeroizing;

/// Per-direction cipher bundle: suite reference, public-key context,
/// cipher context plus a scratch "next" context, and the MAC secret.
/// Each direction of the session holds an active and a pending
/// instance; the pending one is populated during the handshake and
/// activated by ChangeCipherSpec.
pub struct CipherSpec {
    pub suite: &'static CipherSuite,
    pub pubkey: PubkeyContext,
    pub cipher: CipherContext,
    pub cipher_next: CipherContext,
    pub mac_secret: Zeroizing<Vec<u8>>,
}

impl CipherSpec {
    pub fn null() -> Self {
        Self {
            suite: &NULL_CIPHER_SUITE,
            pubkey: PubkeyContext::new(NULL_CIPHER_SUITE.pubkey),
            cipher: CipherContext::new(NULL_CIPHER_SUITE.cipher),
            cipher_next: CipherContext::new(NULL_CIPHER_SUITE.cipher),
            mac_secret: Zeroizing::new(Vec::new()),
        }
    }

    /// Attach a suite, discarding any previous contents and starting
    /// from zeroed contexts.
    pub fn set_suite(&mut self, suite: &'static CipherSuite) {
        self.suite = suite;
        self.pubkey = PubkeyContext::new(suite.pubkey);
        self.cipher = CipherContext::new(suite.cipher);
        self.cipher_next = CipherContext::new(suite.cipher);
        self.mac_secret = Zeroizing::new(Vec::new());
    }

    pub fn clear(&mut self) {
        *self = Self::null();
    }

    pub fn is_null(&self) -> bool {
        std::ptr::eq(self.suite, &NULL_CIPHER_SUITE)
    }

    pub fn set_mac_secret(&mut self, secret: &[u8]) {
        self.mac_secret = Zeroizing::new(secret.to_vec());
    }

    /// Commit the scratch cipher context after a record has been
    /// delivered downstream.
    pub fn commit_cipher(&mut self) {
        self.cipher = self.cipher_next.clone();
    }
}

/// Activate the pending spec for one direction. Refuses the null suite;
/// the previous active spec is cleared and the structures swapped, so
/// the pending spec is left null afterwards.
pub fn change_cipher(
    pending: &mut CipherSpec,
    active: &mut CipherSpec,
) -> Result<(), errors::TlsError> {
    if pending.is_null() {
        return Err(errors::TlsError::NullCipher);
    }
    active.clear();
    std::mem::swap(active, pending);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cipherspec::{change_cipher, CipherSpec};
    use crate::errors;
    use crate::suites;

    #[test]
    fn change_cipher_refuses_null_pending() {
        let mut pending = CipherSpec::null();
        let mut active = CipherSpec::null();
        assert!(matches!(
            change_cipher(&mut pending, &mut active),
            Err(errors::TlsError::NullCipher)
        ));
    }

    #[test]
    fn change_cipher_swaps_and_leaves_pending_null() {
        let suite = suites::find(suites::TLS_RSA_WITH_AES_128_CBC_SHA256).expect("suite");
        let mut pending = CipherSpec::null();
        pending.set_suite(suite);
        pending.set_mac_secret(&[0xab; 32]);

        let mut active = CipherSpec::null();
        change_cipher(&mut pending, &mut active).expect("change cipher failed");

        assert!(pending.is_null());
        assert!(!active.is_null());
        assert_eq!(active.suite.code, suites::TLS_RSA_WITH_AES_128_CBC_SHA256);
        assert_eq!(active.mac_secret.as_slice(), &[0xab; 32]);
    }

    #[test]
    fn set_suite_resets_mac_secret() {
        let suite = suites::find(suites::TLS_RSA_WITH_AES_256_CBC_SHA).expect("suite");
        let mut spec = CipherSpec::null();
        spec.set_mac_secret(&[1, 2, 3]);
        spec.set_suite(suite);
        assert!(spec.mac_secret.is_empty());
        assert!(!spec.is_null());
    }
}
