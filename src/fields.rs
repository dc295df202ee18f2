use byteorder::{BigEndian, ByteOrder};

pub type NetVec<T> = Vec<T>;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Uint8(pub u8);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Uint16(pub u16);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Uint32(pub u32);

// In network order (Big Endian)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Uint24(pub [u8; 3]);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Random(pub [u8; 28]);

pub fn uint24_to_usize(i: Uint24) -> usize {
    BigEndian::read_u24(&i.0) as usize
}

pub fn uint24_from_be_bytes(bytes: [u8; 3]) -> Uint24 {
    Uint24(bytes)
}

pub fn uint24_from_usize(value: usize) -> Result<Uint24, crate::errors::TlsError> {
    if value >= 1 << 24 {
        return Err(crate::errors::TlsError::InvalidLength);
    }
    let mut buf = [0; 3];
    BigEndian::write_u24(&mut buf, value as u32);
    Ok(Uint24(buf))
}
