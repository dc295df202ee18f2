use crate::errors;

use aes::{Aes128, Aes256};
use block_modes::block_padding::NoPadding;
use block_modes::{BlockMode, Cbc};
use zeroize::Zeroizing;

type Aes128Cbc = Cbc<Aes128, NoPadding>;
type Aes256Cbc = Cbc<Aes256, NoPadding>;

pub const AES_BLOCK_SIZE: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CipherAlgorithm {
    Null,
    Aes128Cbc,
    Aes256Cbc,
}

impl CipherAlgorithm {
    pub fn key_len(&self) -> usize {
        match self {
            CipherAlgorithm::Null => 0,
            CipherAlgorithm::Aes128Cbc => 16,
            CipherAlgorithm::Aes256Cbc => 32,
        }
    }

    pub fn block_size(&self) -> usize {
        match self {
            CipherAlgorithm::Null => 0,
            CipherAlgorithm::Aes128Cbc | CipherAlgorithm::Aes256Cbc => AES_BLOCK_SIZE,
        }
    }

    pub fn is_block(&self) -> bool {
        !matches!(self, CipherAlgorithm::Null)
    }
}

/// Symmetric cipher context. Carries the CBC chaining state across
/// records: the IV is seeded from the key block and advanced to the
/// last ciphertext block after every operation. The null algorithm is
/// the identity transform.
///
/// The context is `Clone` so the record layer can encrypt into a
/// scratch copy and commit it only once the record has actually been
/// delivered downstream.
#[derive(Clone)]
pub struct CipherContext {
    algorithm: CipherAlgorithm,
    key: Zeroizing<Vec<u8>>,
    iv: Zeroizing<Vec<u8>>,
}

impl CipherContext {
    pub fn new(algorithm: CipherAlgorithm) -> Self {
        Self {
            algorithm,
            key: Zeroizing::new(Vec::new()),
            iv: Zeroizing::new(vec![0; algorithm.block_size()]),
        }
    }

    pub fn algorithm(&self) -> CipherAlgorithm {
        self.algorithm
    }

    pub fn set_key(&mut self, key: &[u8]) -> Result<(), errors::TlsError> {
        if key.len() != self.algorithm.key_len() {
            return Err(errors::TlsError::InvalidLength);
        }
        self.key = Zeroizing::new(key.to_vec());
        Ok(())
    }

    pub fn set_iv(&mut self, iv: &[u8]) -> Result<(), errors::TlsError> {
        if iv.len() != self.algorithm.block_size() {
            return Err(errors::TlsError::InvalidLength);
        }
        self.iv = Zeroizing::new(iv.to_vec());
        Ok(())
    }

    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, errors::TlsError> {
        let ciphertext = match self.algorithm {
            CipherAlgorithm::Null => return Ok(plaintext.to_vec()),
            CipherAlgorithm::Aes128Cbc => {
                self.check_block_aligned(plaintext)?;
                Aes128Cbc::new_from_slices(&self.key, &self.iv)?.encrypt_vec(plaintext)
            }
            CipherAlgorithm::Aes256Cbc => {
                self.check_block_aligned(plaintext)?;
                Aes256Cbc::new_from_slices(&self.key, &self.iv)?.encrypt_vec(plaintext)
            }
        };
        self.advance_chain(&ciphertext);
        Ok(ciphertext)
    }

    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, errors::TlsError> {
        let plaintext = match self.algorithm {
            CipherAlgorithm::Null => return Ok(ciphertext.to_vec()),
            CipherAlgorithm::Aes128Cbc => {
                self.check_block_aligned(ciphertext)?;
                Aes128Cbc::new_from_slices(&self.key, &self.iv)?.decrypt_vec(ciphertext)?
            }
            CipherAlgorithm::Aes256Cbc => {
                self.check_block_aligned(ciphertext)?;
                Aes256Cbc::new_from_slices(&self.key, &self.iv)?.decrypt_vec(ciphertext)?
            }
        };
        self.advance_chain(ciphertext);
        Ok(plaintext)
    }

    fn check_block_aligned(&self, data: &[u8]) -> Result<(), errors::TlsError> {
        if data.is_empty() || data.len() % AES_BLOCK_SIZE != 0 {
            return Err(errors::TlsError::MalformedRecord(
                "ciphertext not block-aligned",
            ));
        }
        Ok(())
    }

    // CBC residue: the next record chains from the last ciphertext block
    fn advance_chain(&mut self, ciphertext: &[u8]) {
        let block_size = self.algorithm.block_size();
        if ciphertext.len() >= block_size && block_size > 0 {
            self.iv = Zeroizing::new(ciphertext[ciphertext.len() - block_size..].to_vec());
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cipher::{CipherAlgorithm, CipherContext, AES_BLOCK_SIZE};
    use crate::errors;

    fn keyed_pair(algorithm: CipherAlgorithm) -> (CipherContext, CipherContext) {
        let mut tx = CipherContext::new(algorithm);
        tx.set_key(&vec![0x42; algorithm.key_len()]).expect("set_key failed");
        tx.set_iv(&vec![0x24; algorithm.block_size()]).expect("set_iv failed");
        (tx.clone(), tx)
    }

    #[test]
    fn aes128_encrypt_decrypt_round_trip() {
        let (mut tx, mut rx) = keyed_pair(CipherAlgorithm::Aes128Cbc);
        let plaintext = [0x5au8; 48];
        let ciphertext = tx.encrypt(&plaintext).expect("encrypt failed");
        assert_ne!(ciphertext, plaintext.to_vec());
        let decrypted = rx.decrypt(&ciphertext).expect("decrypt failed");
        assert_eq!(decrypted, plaintext.to_vec());
    }

    #[test]
    fn aes256_chaining_carries_across_records() {
        let (mut tx, mut rx) = keyed_pair(CipherAlgorithm::Aes256Cbc);
        let first = tx.encrypt(&[0x01; 32]).expect("encrypt failed");
        let second = tx.encrypt(&[0x02; 32]).expect("encrypt failed");
        assert_eq!(rx.decrypt(&first).expect("decrypt failed"), vec![0x01; 32]);
        assert_eq!(rx.decrypt(&second).expect("decrypt failed"), vec![0x02; 32]);
    }

    #[test]
    fn cloned_context_produces_identical_ciphertext() {
        let (tx, _) = keyed_pair(CipherAlgorithm::Aes128Cbc);
        let mut a = tx.clone();
        let mut b = tx;
        assert_eq!(
            a.encrypt(&[0x33; AES_BLOCK_SIZE]).expect("encrypt failed"),
            b.encrypt(&[0x33; AES_BLOCK_SIZE]).expect("encrypt failed")
        );
    }

    #[test]
    fn unaligned_input_is_rejected() {
        let (mut tx, _) = keyed_pair(CipherAlgorithm::Aes128Cbc);
        assert!(matches!(
            tx.encrypt(&[0u8; 15]),
            Err(errors::TlsError::MalformedRecord(_))
        ));
    }

    #[test]
    fn null_cipher_is_identity() {
        let mut ctx = CipherContext::new(CipherAlgorithm::Null);
        assert_eq!(ctx.encrypt(b"payload").expect("encrypt failed"), b"payload");
        assert_eq!(ctx.decrypt(b"payload").expect("decrypt failed"), b"payload");
    }

    #[test]
    fn wrong_key_length_is_rejected() {
        let mut ctx = CipherContext::new(CipherAlgorithm::Aes256Cbc);
        assert!(ctx.set_key(&[0u8; 16]).is_err());
        assert!(ctx.set_iv(&[0u8; 8]).is_err());
    }
}
