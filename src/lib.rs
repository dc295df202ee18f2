#[macro_use]
extern crate enum_primitive_derive;
extern crate num_traits;

mod alert;
mod cipher;
mod cipherspec;
pub mod clientcert;
mod crypto;
mod errors;
mod extensions;
mod fields;
mod handshake;
mod handshaker;
mod pack;
mod pubkey;
mod record;
mod session;
pub mod stream;
mod suites;
mod test;
mod transcript;
pub mod x509;

pub use errors::TlsError;
pub use stream::{add_tls, add_tls_with_verifier, ByteStream, CipherStream, PlainStream};
