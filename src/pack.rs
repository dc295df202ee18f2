use crate::errors;
use crate::fields;

use byteorder::{BigEndian, ByteOrder};

pub trait Pack {
    fn empty() -> Self;
    fn len(&self) -> usize {
        self.pack().len()
    }
    fn pack(&self) -> Vec<u8>;
    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError>;
}

impl<E> Pack for fields::NetVec<E>
where
    E: Pack + Clone,
{
    fn empty() -> Self {
        fields::NetVec::new()
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        for e in self {
            v.extend_from_slice(&*e.pack());
        }
        v
    }

    fn unpack(&mut self, _v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        Err(errors::TlsError::InvalidLength)
    }
}

impl Pack for fields::Uint8 {
    fn empty() -> Self {
        fields::Uint8(0)
    }

    fn pack(&self) -> Vec<u8> {
        vec![self.0]
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        match v.len() {
            0 => Err(errors::TlsError::InvalidLength),
            _ => {
                let rest: Vec<u8> = v.drain(1..).collect();
                self.0 = v[0];
                Ok(rest)
            }
        }
    }
}

impl Pack for fields::Uint16 {
    fn empty() -> Self {
        fields::Uint16(0)
    }

    fn pack(&self) -> Vec<u8> {
        let mut bytes: [u8; 2] = [0; 2];
        BigEndian::write_u16(&mut bytes, self.0);
        bytes.to_vec()
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        match v.len() {
            0..=1 => Err(errors::TlsError::InvalidLength),
            _ => {
                let rest: Vec<u8> = v.drain(2..).collect();
                self.0 = u16::from_be_bytes([v[0], v[1]]);
                Ok(rest)
            }
        }
    }
}

impl Pack for fields::Uint24 {
    fn empty() -> Self {
        fields::Uint24([0; 3])
    }

    fn pack(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        match v.len() {
            0..=2 => Err(errors::TlsError::InvalidLength),
            _ => {
                let rest: Vec<u8> = v.drain(3..).collect();
                self.0 = [v[0], v[1], v[2]];
                Ok(rest)
            }
        }
    }
}

impl Pack for fields::Uint32 {
    fn empty() -> Self {
        fields::Uint32(0)
    }

    fn pack(&self) -> Vec<u8> {
        let mut bytes: [u8; 4] = [0; 4];
        BigEndian::write_u32(&mut bytes, self.0);
        bytes.to_vec()
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        match v.len() {
            0..=3 => Err(errors::TlsError::InvalidLength),
            _ => {
                let rest: Vec<u8> = v.drain(4..).collect();
                self.0 = u32::from_be_bytes([v[0], v[1], v[2], v[3]]);
                Ok(rest)
            }
        }
    }
}

impl Pack for fields::Random {
    fn empty() -> Self {
        fields::Random([0; 28])
    }

    fn pack(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        match v.len() {
            0..=27 => Err(errors::TlsError::InvalidLength),
            _ => {
                let rest: Vec<u8> = v.drain(28..).collect();
                let mut random = [0; 28];
                random.copy_from_slice(&v[..28]);
                self.0 = random;
                Ok(rest)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::fields;
    use crate::pack::Pack;
    use crate::pack_unpack_inverse_test;

    pack_unpack_inverse_test!(uint8_pack_unpack_inverse_test, fields::Uint8(14));

    pack_unpack_inverse_test!(uint16_pack_unpack_inverse_test, fields::Uint16(9));

    pack_unpack_inverse_test!(uint24_pack_unpack_inverse_test, fields::Uint24([250, 100, 4]));

    pack_unpack_inverse_test!(uint32_pack_unpack_inverse_test, fields::Uint32(7777));

    pack_unpack_inverse_test!(random_pack_unpack_inverse_test, fields::Random::empty());

    #[test]
    fn uint24_usize_round_trip() {
        let i = fields::uint24_from_usize(0x012345).expect("uint24 conversion failed");
        assert_eq!(i.pack(), vec![0x01, 0x23, 0x45]);
        assert_eq!(fields::uint24_to_usize(i), 0x012345);
    }
}
