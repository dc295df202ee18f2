//! Process-global client credential slots, provided by the embedding
//! platform. Both are opaque DER byte arrays and may stay empty.

use std::sync::Mutex;

static CLIENT_CERTIFICATE: Mutex<Option<Vec<u8>>> = Mutex::new(None);
static CLIENT_PRIVATE_KEY: Mutex<Option<Vec<u8>>> = Mutex::new(None);

fn read(slot: &Mutex<Option<Vec<u8>>>) -> Option<Vec<u8>> {
    match slot.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn write(slot: &Mutex<Option<Vec<u8>>>, value: Option<Vec<u8>>) {
    match slot.lock() {
        Ok(mut guard) => *guard = value,
        Err(poisoned) => *poisoned.into_inner() = value,
    }
}

/// Install or clear the client certificate (DER).
pub fn set_certificate(der: Option<Vec<u8>>) {
    write(&CLIENT_CERTIFICATE, der);
}

pub fn certificate() -> Option<Vec<u8>> {
    read(&CLIENT_CERTIFICATE)
}

/// Install or clear the client private key (PKCS#1 or PKCS#8 DER).
pub fn set_private_key(der: Option<Vec<u8>>) {
    write(&CLIENT_PRIVATE_KEY, der);
}

pub fn private_key() -> Option<Vec<u8>> {
    read(&CLIENT_PRIVATE_KEY)
}
