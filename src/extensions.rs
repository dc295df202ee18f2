use crate::errors;
use crate::fields;
use crate::pack::Pack;

use std::convert::TryFrom;

pub const SERVER_NAME_EXTENSION: u16 = 0;
pub const SERVER_NAME_HOST_NAME: u8 = 0;

/// A single ClientHello extension. The type code is kept raw so that
/// lists containing extensions we do not build can still be unpacked.
#[derive(Clone, Debug)]
pub struct Extension {
    extension_type: fields::Uint16,
    extension_data_length: fields::Uint16,
    extension_data: Vec<u8>,
}

impl Extension {
    /// server_name extension: a one-entry server_name_list holding the
    /// host_name type and the ASCII name without a trailing NUL.
    pub fn server_name(host: &str) -> Result<Self, errors::TlsError> {
        let name = host.as_bytes();
        let name_len = u16::try_from(name.len())?;

        let mut data = Vec::with_capacity(name.len() + 5);
        data.extend_from_slice(&fields::Uint16(name_len + 3).pack());
        data.push(SERVER_NAME_HOST_NAME);
        data.extend_from_slice(&fields::Uint16(name_len).pack());
        data.extend_from_slice(name);

        Ok(Self {
            extension_type: fields::Uint16(SERVER_NAME_EXTENSION),
            extension_data_length: fields::Uint16(u16::try_from(data.len())?),
            extension_data: data,
        })
    }
}

impl Pack for Extension {
    fn empty() -> Self {
        Self {
            extension_type: fields::Uint16::empty(),
            extension_data_length: fields::Uint16::empty(),
            extension_data: Vec::new(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.extension_type.pack());
        v.extend_from_slice(&self.extension_data_length.pack());
        v.extend_from_slice(&self.extension_data);
        v
    }

    fn unpack(&mut self, v: &mut Vec<u8>) -> Result<Vec<u8>, errors::TlsError> {
        let mut v = self.extension_type.unpack(v)?;
        let mut v = self.extension_data_length.unpack(&mut v)?;
        let length = self.extension_data_length.0 as usize;
        if v.len() < length {
            return Err(errors::TlsError::InvalidLength);
        }
        let rest: Vec<u8> = v.drain(length..).collect();
        self.extension_data = v;
        Ok(rest)
    }
}

#[derive(Clone, Debug)]
pub struct ExtensionList {
    length: fields::Uint16,
    extensions: Vec<Extension>,
}

impl ExtensionList {
    pub fn new(extensions: Vec<Extension>) -> Result<Self, errors::TlsError> {
        let total: usize = extensions.iter().map(|e| e.len()).sum();
        Ok(Self {
            length: fields::Uint16(u16::try_from(total)?),
            extensions,
        })
    }
}

impl Pack for ExtensionList {
    fn empty() -> Self {
        Self {
            length: fields::Uint16::empty(),
            extensions: Vec::new(),
        }
    }

    fn pack(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&self.length.pack());
        for extension in &self.extensions {
            v.extend_from_slice(&extension.pack());
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

        self.extensions = Vec::new();
        while !v.is_empty() {
            let mut extension = Extension::empty();
            v = extension.unpack(&mut v)?;
            self.extensions.push(extension);
        }
        Ok(rest)
    }
}

#[cfg(test)]
mod tests {
    use crate::extensions;
    use crate::pack::Pack;
    use crate::pack_unpack_inverse_test;

    pack_unpack_inverse_test!(
        extension_pack_unpack_inverse_test,
        extensions::Extension::server_name("example.com").expect("building extension failed")
    );

    pack_unpack_inverse_test!(
        extension_list_pack_unpack_inverse_test,
        extensions::ExtensionList::new(vec![
            extensions::Extension::server_name("example.com").expect("building extension failed")
        ])
        .expect("building ExtensionList failed")
    );

    #[test]
    fn server_name_wire_format() {
        let extension =
            extensions::Extension::server_name("host").expect("building extension failed");
        assert_eq!(
            extension.pack(),
            vec![
                0x00, 0x00, // extension type: server_name
                0x00, 0x09, // extension data length
                0x00, 0x07, // server_name_list length
                0x00, // name type: host_name
                0x00, 0x04, // name length
                b'h', b'o', b's', b't',
            ]
        );
    }
}
