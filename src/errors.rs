use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TlsError {
    #[error("Cipher suite not supported: {0:#06x}")]
    CipherNotSupported(u16),
    #[error("Protocol version not supported: {0:#06x}")]
    VersionNotSupported(u16),
    #[error("Signature and hash algorithm not supported")]
    SignatureHashNotSupported,
    #[error("Refusing to activate the null cipher")]
    NullCipher,

    #[error("Server attempted upgrade to protocol version {0:#06x}")]
    VersionUpgrade(u16),
    #[error("Malformed record: {0}")]
    MalformedRecord(&'static str),

    #[error("invalid length")]
    InvalidLength,
    #[error("Invalid padding")]
    InvalidPadding,
    #[error("Invalid Change Cipher Spec payload")]
    InvalidChangeCipherSpec,

    #[error("Record MAC verification failed")]
    BadRecordMac,
    #[error("Finished verification failed")]
    FinishedMismatch,
    #[error("Received fatal alert {0}")]
    FatalAlert(u8),
    #[error("Received alert with unknown level {0}")]
    UnknownAlertLevel(u8),

    #[error("Incomplete certificate chain")]
    IncompleteChain,
    #[error("Incorrect server name")]
    WrongName,

    #[error("Application write before handshake completion")]
    NotConnected,

    #[error("Cryptographic operation failed: {0}")]
    CryptoFailure(&'static str),

    #[error("{0}")]
    TryFromIntError(#[from] std::num::TryFromIntError),
    #[error("{0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
    #[error("{0}")]
    InvalidKeyIvLengthError(#[from] block_modes::InvalidKeyIvLength),
    #[error("{0}")]
    BlockModeError(#[from] block_modes::BlockModeError),
}
