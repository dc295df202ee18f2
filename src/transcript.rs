use crate::crypto::{DigestAlgorithm, DigestContext};

/// Running handshake transcript. Both digest families accumulate until
/// the protocol version is known; after ServerHello the session selects
/// MD5+SHA-1 (TLSv1.1 and earlier) or SHA-256 (TLSv1.2).
pub struct Transcript {
    md5_sha1: DigestContext,
    sha256: DigestContext,
    legacy: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            md5_sha1: DigestContext::new(DigestAlgorithm::Md5Sha1),
            sha256: DigestContext::new(DigestAlgorithm::Sha256),
            legacy: false,
        }
    }

    pub fn add(&mut self, data: &[u8]) {
        self.md5_sha1.update(data);
        self.sha256.update(data);
    }

    /// Switch handshake verification to the MD5+SHA-1 hybrid, for
    /// versions earlier than TLSv1.2.
    pub fn select_legacy(&mut self) {
        self.legacy = true;
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        if self.legacy {
            DigestAlgorithm::Md5Sha1
        } else {
            DigestAlgorithm::Sha256
        }
    }

    /// Finalize a snapshot of the active digest. The running contexts
    /// remain usable for later records.
    pub fn current_digest(&self) -> Vec<u8> {
        if self.legacy {
            self.md5_sha1.clone().finish()
        } else {
            self.sha256.clone().finish()
        }
    }
}
