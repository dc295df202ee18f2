use crate::errors::TlsError;
use crate::session::Session;
use crate::x509::{CertificateVerifier, X509Verifier};

use std::cell::RefCell;
use std::rc::Rc;

/// One direction of a byte-stream boundary. The session writes
/// ciphertext into the downstream implementation supplied by the
/// embedder; the same contract governs flow control and close
/// propagation on both sides.
pub trait ByteStream {
    /// Flow-control window: how many bytes `deliver` currently accepts.
    fn window(&self) -> usize;
    fn deliver(&mut self, data: &[u8]) -> Result<(), TlsError>;
    fn close(&mut self, reason: Option<&TlsError>);
}

/// Plaintext-side handle held by the application.
pub struct PlainStream {
    session: Rc<RefCell<Session>>,
}

impl PlainStream {
    /// Zero until the server Finished has verified, then the
    /// ciphertext window passes through.
    pub fn window(&self) -> usize {
        self.session.borrow().window()
    }

    pub fn is_ready(&self) -> bool {
        self.session.borrow().is_ready()
    }

    /// Encrypt and transmit application bytes. Fails with
    /// `NotConnected` until the handshake has completed.
    pub fn deliver(&mut self, data: &[u8]) -> Result<(), TlsError> {
        let result = self.session.borrow_mut().deliver_plaintext(data);
        self.session.borrow_mut().pump();
        result
    }

    /// Drain decrypted application data received so far.
    pub fn receive(&mut self) -> Vec<u8> {
        self.session.borrow_mut().take_plaintext()
    }

    pub fn close(&mut self) {
        self.session.borrow_mut().close(None);
    }

    pub fn is_closed(&self) -> bool {
        self.session.borrow().is_closed()
    }

    pub fn close_reason(&self) -> Option<TlsError> {
        self.session.borrow().close_reason()
    }
}

/// Ciphertext-side handle wired to the transport.
pub struct CipherStream {
    session: Rc<RefCell<Session>>,
}

impl CipherStream {
    /// Feed network bytes into the record reassembler. Record and
    /// handshake errors close the session; inspect `close_reason`.
    pub fn deliver(&mut self, data: &[u8]) {
        let mut session = self.session.borrow_mut();
        session.deliver_ciphertext(data);
        session.pump();
    }

    /// The transport window opened up: reschedule the TX step.
    pub fn window_changed(&mut self) {
        let mut session = self.session.borrow_mut();
        session.tx_resume();
        session.pump();
    }

    pub fn close(&mut self) {
        self.session.borrow_mut().close(None);
    }

    pub fn is_closed(&self) -> bool {
        self.session.borrow().is_closed()
    }

    pub fn close_reason(&self) -> Option<TlsError> {
        self.session.borrow().close_reason()
    }
}

/// Instantiate a TLS client session above `downstream`. The returned
/// plaintext handle goes to the application, the ciphertext handle to
/// the transport. The ClientHello is transmitted immediately if the
/// downstream window allows.
pub fn add_tls(
    downstream: Box<dyn ByteStream>,
    server_name: &str,
) -> Result<(PlainStream, CipherStream), TlsError> {
    add_tls_with_verifier(downstream, server_name, Box::new(X509Verifier))
}

/// As `add_tls`, with an explicit certificate-chain collaborator for
/// embedders that supply their own trust policy.
pub fn add_tls_with_verifier(
    downstream: Box<dyn ByteStream>,
    server_name: &str,
    verifier: Box<dyn CertificateVerifier>,
) -> Result<(PlainStream, CipherStream), TlsError> {
    let session = Session::new(downstream, server_name, verifier)?;
    let session = Rc::new(RefCell::new(session));
    session.borrow_mut().pump();
    Ok((
        PlainStream {
            session: session.clone(),
        },
        CipherStream { session },
    ))
}
