use crate::errors;
use crate::record;

use digest::core_api::BlockSizeUser;
use digest::Digest;
use hmac::{Mac, SimpleHmac};
use md5::Md5;
use ring::rand::SecureRandom;
use sha1::Sha1;
use sha2::Sha256;

pub const MASTER_SECRET_STR: &[u8; 13] = b"master secret";
pub const MASTER_SECRET_LEN: usize = 48;
pub const KEY_BLOCK_STR: &[u8; 13] = b"key expansion";
pub const PRE_MASTER_SECRET_LEN: usize = 48;
pub const VERIFY_DATA_LENGTH: usize = 12;

pub type MasterSecret = [u8; MASTER_SECRET_LEN];

/// Digest algorithms referenced by cipher suites and the handshake
/// transcript. `Md5Sha1` is the hybrid digest used by TLSv1.1 and
/// earlier; `Null` is the identity sentinel of the null cipher suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Null,
    Md5,
    Sha1,
    Sha256,
    Md5Sha1,
}

impl DigestAlgorithm {
    pub fn digest_size(&self) -> usize {
        match self {
            DigestAlgorithm::Null => 0,
            DigestAlgorithm::Md5 => 16,
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Md5Sha1 => 36,
        }
    }
}

#[derive(Clone)]
pub enum DigestContext {
    Null,
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Md5Sha1(Md5, Sha1),
}

impl DigestContext {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Null => DigestContext::Null,
            DigestAlgorithm::Md5 => DigestContext::Md5(Md5::new()),
            DigestAlgorithm::Sha1 => DigestContext::Sha1(Sha1::new()),
            DigestAlgorithm::Sha256 => DigestContext::Sha256(Sha256::new()),
            DigestAlgorithm::Md5Sha1 => DigestContext::Md5Sha1(Md5::new(), Sha1::new()),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            DigestContext::Null => (),
            DigestContext::Md5(ctx) => ctx.update(data),
            DigestContext::Sha1(ctx) => ctx.update(data),
            DigestContext::Sha256(ctx) => ctx.update(data),
            DigestContext::Md5Sha1(md5, sha1) => {
                md5.update(data);
                sha1.update(data);
            }
        }
    }

    pub fn finish(self) -> Vec<u8> {
        match self {
            DigestContext::Null => Vec::new(),
            DigestContext::Md5(ctx) => ctx.finalize().to_vec(),
            DigestContext::Sha1(ctx) => ctx.finalize().to_vec(),
            DigestContext::Sha256(ctx) => ctx.finalize().to_vec(),
            DigestContext::Md5Sha1(md5, sha1) => {
                let mut out = md5.finalize().to_vec();
                out.extend_from_slice(&sha1.finalize());
                out
            }
        }
    }
}

/// Generate random bits with no additional input and without prediction
/// resistance.
pub fn generate_random(rand: &dyn SecureRandom, buf: &mut [u8]) -> Result<(), errors::TlsError> {
    rand.fill(buf)
        .map_err(|_| errors::TlsError::CryptoFailure("random generation failed"))
}

fn hmac_digest<D>(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, errors::TlsError>
where
    D: Digest + BlockSizeUser + Clone,
{
    let mut mac = <SimpleHmac<D> as Mac>::new_from_slice(key)
        .map_err(|_| errors::TlsError::CryptoFailure("HMAC key rejected"))?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

/// HMAC keyed by the digest algorithm a cipher suite references. The
/// null algorithm produces an empty MAC.
pub fn hmac(
    algorithm: DigestAlgorithm,
    key: &[u8],
    parts: &[&[u8]],
) -> Result<Vec<u8>, errors::TlsError> {
    match algorithm {
        DigestAlgorithm::Null => Ok(Vec::new()),
        DigestAlgorithm::Md5 => hmac_digest::<Md5>(key, parts),
        DigestAlgorithm::Sha1 => hmac_digest::<Sha1>(key, parts),
        DigestAlgorithm::Sha256 => hmac_digest::<Sha256>(key, parts),
        DigestAlgorithm::Md5Sha1 => Err(errors::TlsError::CryptoFailure(
            "hybrid digest has no HMAC form",
        )),
    }
}

// P_hash expansion (RFC 5246 section 5):
//   A(0) = seed
//   A(i) = HMAC_hash(secret, A(i-1))
//   P_hash = HMAC_hash(secret, A(1) + seed) || HMAC_hash(secret, A(2) + seed) || ...
fn p_hash<D>(secret: &[u8], label_seed: &[u8], out_len: usize) -> Result<Vec<u8>, errors::TlsError>
where
    D: Digest + BlockSizeUser + Clone,
{
    let mut result = Vec::with_capacity(out_len);
    let mut a = hmac_digest::<D>(secret, &[label_seed])?;

    while result.len() < out_len {
        let block = hmac_digest::<D>(secret, &[a.as_slice(), label_seed])?;
        result.extend_from_slice(&block);
        a = hmac_digest::<D>(secret, &[a.as_slice()])?;
    }

    result.truncate(out_len);
    Ok(result)
}

/// TLS pseudo-random function. P_SHA256 for TLSv1.2 and later; the
/// combination of P_MD5 and P_SHA-1 with a split-half secret for
/// TLSv1.1 and earlier. The seed is always `label || seeds...`.
pub fn prf(
    version: record::ProtocolVersion,
    secret: &[u8],
    out_len: usize,
    label: &[u8],
    seeds: &[&[u8]],
) -> Result<Vec<u8>, errors::TlsError> {
    let mut label_seed = label.to_vec();
    for seed in seeds {
        label_seed.extend_from_slice(seed);
    }

    if version >= record::TLS_1_2 {
        p_hash::<Sha256>(secret, &label_seed, out_len)
    } else {
        // Split secret into two halves, with an overlap of up to one byte
        let half = (secret.len() + 1) / 2;
        let md5_secret = &secret[..half];
        let sha1_secret = &secret[secret.len() - half..];

        let mut out = p_hash::<Md5>(md5_secret, &label_seed, out_len)?;
        let sha1_out = p_hash::<Sha1>(sha1_secret, &label_seed, out_len)?;
        for (lhs, rhs) in out.iter_mut().zip(sha1_out.iter()) {
            *lhs ^= rhs;
        }
        Ok(out)
    }
}

// master_secret = PRF(pre_master_secret, "master secret",
//                     client_random + server_random)[0..47]
pub fn master_secret(
    version: record::ProtocolVersion,
    pre_master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
) -> Result<MasterSecret, errors::TlsError> {
    let result = prf(
        version,
        pre_master_secret,
        MASTER_SECRET_LEN,
        MASTER_SECRET_STR,
        &[client_random, server_random],
    )?;

    let mut master_secret = [0; MASTER_SECRET_LEN];
    master_secret.copy_from_slice(&result);
    Ok(master_secret)
}

// key_block = PRF(master_secret, "key expansion",
//                 server_random + client_random); note the reversed
// random order relative to the master secret derivation.
pub fn key_block(
    version: record::ProtocolVersion,
    master_secret: &[u8],
    server_random: &[u8],
    client_random: &[u8],
    out_len: usize,
) -> Result<Vec<u8>, errors::TlsError> {
    prf(
        version,
        master_secret,
        out_len,
        KEY_BLOCK_STR,
        &[server_random, client_random],
    )
}

/// Finished verify_data: 12 bytes of PRF output binding the handshake
/// transcript digest to the master secret.
pub fn verify_data(
    version: record::ProtocolVersion,
    master_secret: &[u8],
    finished_label: &[u8],
    transcript_digest: &[u8],
) -> Result<Vec<u8>, errors::TlsError> {
    prf(
        version,
        master_secret,
        VERIFY_DATA_LENGTH,
        finished_label,
        &[transcript_digest],
    )
}

#[cfg(test)]
mod tests {
    use crate::crypto;
    use crate::crypto::{DigestAlgorithm, DigestContext};
    use crate::record;

    use hex;

    // Borrowed test vector from rustls
    #[test]
    fn check_p_sha256() {
        let secret: &[u8] = b"\x9b\xbe\x43\x6b\xa9\x40\xf0\x17\xb1\x76\x52\x84\x9a\x71\xdb\x35";
        let seed: &[u8] = b"\xa0\xba\x9f\x93\x6c\xda\x31\x18\x27\xa6\xf7\x96\xff\xd5\x19\x8c";
        let label: &[u8] = b"test label";
        let expect = hex::decode(
            "e3f229ba727be17b8d122620557cd453c2aab21d07c3d495329b52d4e61edb5a6b301791e90d35c9c9a46b4e14baf9af0fa022f7077def17abfd3797c0564bab4fbc91666e9def9b97fce34f796789baa48082d122ee42c5a72e5a5110fff70187347b66",
        )
        .expect("decode bytes failed");
        let output = crypto::prf(record::TLS_1_2, secret, expect.len(), label, &[seed])
            .expect("PRF failed");
        assert_eq!(expect, output);
    }

    #[test]
    fn prf_is_deterministic() {
        let seed: &[u8] = &[0x03];
        for &version in &[record::TLS_1_0, record::TLS_1_1, record::TLS_1_2] {
            let a = crypto::prf(version, &[0x01, 0x02], 48, b"test label", &[seed])
                .expect("PRF failed");
            let b = crypto::prf(version, &[0x01, 0x02], 48, b"test label", &[seed])
                .expect("PRF failed");
            assert_eq!(a, b);
            assert_eq!(a.len(), 48);
        }
    }

    #[test]
    fn prf_legacy_is_md5_xor_sha1_with_split_secret() {
        // Odd-length secret: the halves overlap by one byte
        let secret = [0x01, 0x02, 0x03];
        let label = b"test label";
        let seed: &[u8] = &[0x04; 7];

        let out = crypto::prf(record::TLS_1_0, &secret, 40, label, &[seed]).expect("PRF failed");

        let mut label_seed = label.to_vec();
        label_seed.extend_from_slice(seed);
        let mut expect = super::p_hash::<md5::Md5>(&secret[..2], &label_seed, 40)
            .expect("P_MD5 failed");
        let sha1_out = super::p_hash::<sha1::Sha1>(&secret[1..], &label_seed, 40)
            .expect("P_SHA1 failed");
        for (lhs, rhs) in expect.iter_mut().zip(sha1_out.iter()) {
            *lhs ^= rhs;
        }
        assert_eq!(out, expect);
    }

    #[test]
    fn prf_differs_between_version_families() {
        let seed: &[u8] = &[0xcd; 8];
        let legacy = crypto::prf(record::TLS_1_1, &[0xab; 16], 32, b"test label", &[seed])
            .expect("PRF failed");
        let modern = crypto::prf(record::TLS_1_2, &[0xab; 16], 32, b"test label", &[seed])
            .expect("PRF failed");
        assert_ne!(legacy, modern);
    }

    #[test]
    fn master_secret_length_and_determinism() {
        let pre_master = [0u8; crypto::PRE_MASTER_SECRET_LEN];
        let client_random = [0u8; 32];
        let server_random = [1u8; 32];
        let a = crypto::master_secret(record::TLS_1_2, &pre_master, &client_random, &server_random)
            .expect("master secret failed");
        let b = crypto::master_secret(record::TLS_1_2, &pre_master, &client_random, &server_random)
            .expect("master secret failed");
        assert_eq!(a.len(), crypto::MASTER_SECRET_LEN);
        assert_eq!(a, b);
    }

    #[test]
    fn verify_data_is_always_12_bytes() {
        let master = [0x55u8; crypto::MASTER_SECRET_LEN];
        for &version in &[record::TLS_1_0, record::TLS_1_1, record::TLS_1_2] {
            let out = crypto::verify_data(version, &master, b"client finished", &[0xaa; 32])
                .expect("verify_data failed");
            assert_eq!(out.len(), crypto::VERIFY_DATA_LENGTH);
        }
    }

    #[test]
    fn digest_facade_known_answers() {
        let mut md5 = DigestContext::new(DigestAlgorithm::Md5);
        md5.update(b"abc");
        assert_eq!(
            md5.finish(),
            hex::decode("900150983cd24fb0d6963f7d28e17f72").expect("decode failed")
        );

        let mut sha1 = DigestContext::new(DigestAlgorithm::Sha1);
        sha1.update(b"abc");
        assert_eq!(
            sha1.finish(),
            hex::decode("a9993e364706816aba3e25717850c26c9cd0d89d").expect("decode failed")
        );

        let mut sha256 = DigestContext::new(DigestAlgorithm::Sha256);
        sha256.update(b"abc");
        assert_eq!(
            sha256.finish(),
            hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
                .expect("decode failed")
        );
    }

    #[test]
    fn hybrid_digest_is_md5_concat_sha1() {
        let mut hybrid = DigestContext::new(DigestAlgorithm::Md5Sha1);
        hybrid.update(b"ab");
        hybrid.update(b"c");
        let out = hybrid.finish();
        assert_eq!(out.len(), DigestAlgorithm::Md5Sha1.digest_size());
        assert_eq!(
            out,
            hex::decode("900150983cd24fb0d6963f7d28e17f72a9993e364706816aba3e25717850c26c9cd0d89d")
                .expect("decode failed")
        );
    }

    #[test]
    fn hmac_null_is_empty() {
        let out = crypto::hmac(DigestAlgorithm::Null, &[], &[b"payload"]).expect("hmac failed");
        assert!(out.is_empty());
    }
}
