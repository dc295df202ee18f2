use crate::errors;

use num_traits::FromPrimitive;

#[derive(Debug, Copy, Clone, PartialEq, Primitive)]
#[repr(u8)]
pub enum AlertLevel {
    Warning = 1,
    Fatal = 2,
}

#[derive(Debug, Copy, Clone, PartialEq, Primitive)]
#[repr(u8)]
pub enum AlertDescription {
    CloseNotify = 0,
    UnexpectedMessage = 10,
    BadRecordMac = 20,
    DecryptionFailedRESERVED = 21,
    RecordOverflow = 22,
    DecompressionFailure = 30,
    HandshakeFailure = 40,
    NoCertificateRESERVED = 41,
    BadCertificate = 42,
    UnsupportedCertificate = 43,
    CertificateRevoked = 44,
    CertificateExpired = 45,
    CertificateUnknown = 46,
    IllegalParameter = 47,
    UnknownCa = 48,
    AccessDenied = 49,
    DecodeError = 50,
    DecryptError = 51,
    ExportRestrictionRESERVED = 60,
    ProtocolVersion = 70,
    InsufficientSecurity = 71,
    InternalError = 80,
    UserCanceled = 90,
    NoRenegotiation = 100,
    UnsupportedExtension = 110,
}

/// Two-byte alert payload. Level and description are kept raw so that
/// alerts outside the known catalog still report faithfully.
#[derive(Debug, Copy, Clone)]
pub struct Alert {
    pub level: u8,
    pub description: u8,
}

impl Alert {
    pub fn parse(data: &[u8]) -> Result<Self, errors::TlsError> {
        if data.len() != 2 {
            return Err(errors::TlsError::InvalidLength);
        }
        Ok(Self {
            level: data[0],
            description: data[1],
        })
    }

    pub fn level(&self) -> Option<AlertLevel> {
        AlertLevel::from_u8(self.level)
    }

    pub fn description(&self) -> Option<AlertDescription> {
        AlertDescription::from_u8(self.description)
    }
}

#[cfg(test)]
mod tests {
    use crate::alert::{Alert, AlertDescription, AlertLevel};
    use crate::errors;

    #[test]
    fn parse_known_alert() {
        let alert = Alert::parse(&[2, 40]).expect("parse failed");
        assert_eq!(alert.level(), Some(AlertLevel::Fatal));
        assert_eq!(alert.description(), Some(AlertDescription::HandshakeFailure));
    }

    #[test]
    fn parse_preserves_unknown_codes() {
        let alert = Alert::parse(&[3, 200]).expect("parse failed");
        assert_eq!(alert.level(), None);
        assert_eq!(alert.description(), None);
        assert_eq!(alert.level, 3);
        assert_eq!(alert.description, 200);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(matches!(
            Alert::parse(&[1]),
            Err(errors::TlsError::InvalidLength)
        ));
        assert!(matches!(
            Alert::parse(&[1, 0, 0]),
            Err(errors::TlsError::InvalidLength)
        ));
    }
}
