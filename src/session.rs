use crate::alert;
use crate::cipherspec::{self, CipherSpec};
use crate::clientcert;
use crate::crypto;
use crate::errors;
use crate::fields;
use crate::handshake::{self, HandshakeType};
use crate::handshaker;
use crate::pack::Pack;
use crate::pubkey::{self, PubkeyAlgorithm};
use crate::record::{self, ContentType, ProtocolVersion, RecordHeader};
use crate::stream::ByteStream;
use crate::suites;
use crate::transcript::Transcript;
use crate::x509::{self, CertificateVerifier};

use log::{debug, trace, warn};
use num_traits::FromPrimitive;
use ring::rand;
use std::convert::TryFrom;
use std::time::SystemTime;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

// Scheduled outbound handshake records, consumed lowest bit first
pub const TX_CLIENT_HELLO: u8 = 0x01;
pub const TX_CERTIFICATE: u8 = 0x02;
pub const TX_CLIENT_KEY_EXCHANGE: u8 = 0x04;
pub const TX_CERTIFICATE_VERIFY: u8 = 0x08;
pub const TX_CHANGE_CIPHER: u8 = 0x10;
pub const TX_FINISHED: u8 = 0x20;

#[derive(Clone, Copy, Debug, PartialEq)]
enum RxState {
    Header,
    Body,
}

pub struct Session {
    version: ProtocolVersion,
    server_name: String,
    rand: rand::SystemRandom,

    client_random: handshake::Random,
    server_random: Option<handshake::Random>,
    pre_master_secret: Option<Zeroizing<Vec<u8>>>,
    master_secret: Zeroizing<crypto::MasterSecret>,

    tx_cipherspec: CipherSpec,
    tx_cipherspec_pending: CipherSpec,
    rx_cipherspec: CipherSpec,
    rx_cipherspec_pending: CipherSpec,
    tx_seq: u64,
    rx_seq: u64,

    transcript: Transcript,

    client_certificate: Option<Vec<u8>>,
    client_private_key: Option<Vec<u8>>,
    verify_pubkey: Option<PubkeyAlgorithm>,
    verifier: Box<dyn CertificateVerifier>,

    tx_pending: u8,
    tx_scheduled: bool,
    tx_ready: bool,

    rx_state: RxState,
    rx_header: [u8; record::RECORD_HEADER_LEN],
    rx_record_header: RecordHeader,
    rx_data: Vec<u8>,
    rx_rcvd: usize,

    downstream: Box<dyn ByteStream>,
    plain_rx: Vec<u8>,

    closed: bool,
    close_reason: Option<errors::TlsError>,
}

impl Session {
    pub(crate) fn new(
        downstream: Box<dyn ByteStream>,
        server_name: &str,
        verifier: Box<dyn CertificateVerifier>,
    ) -> Result<Self, errors::TlsError> {
        let rand = rand::SystemRandom::new();
        let version = record::TLS_1_2;
        let client_random = handshake::Random::new(&rand)?;

        // Pre-master secret: client version followed by 46 random bytes
        let mut pre_master_secret = Zeroizing::new(vec![0; crypto::PRE_MASTER_SECRET_LEN]);
        pre_master_secret[..2].copy_from_slice(&version.pack());
        crypto::generate_random(&rand, &mut pre_master_secret[2..])?;

        Ok(Self {
            version,
            server_name: server_name.to_string(),
            rand,
            client_random,
            server_random: None,
            pre_master_secret: Some(pre_master_secret),
            master_secret: Zeroizing::new([0; crypto::MASTER_SECRET_LEN]),
            tx_cipherspec: CipherSpec::null(),
            tx_cipherspec_pending: CipherSpec::null(),
            rx_cipherspec: CipherSpec::null(),
            rx_cipherspec_pending: CipherSpec::null(),
            tx_seq: 0,
            rx_seq: 0,
            transcript: Transcript::new(),
            client_certificate: clientcert::certificate(),
            client_private_key: clientcert::private_key(),
            verify_pubkey: None,
            verifier,
            tx_pending: TX_CLIENT_HELLO,
            tx_scheduled: true,
            tx_ready: false,
            rx_state: RxState::Header,
            rx_header: [0; record::RECORD_HEADER_LEN],
            rx_record_header: RecordHeader::empty(),
            rx_data: Vec::new(),
            rx_rcvd: 0,
            downstream,
            plain_rx: Vec::new(),
            closed: false,
            close_reason: None,
        })
    }

    //
    // Lifecycle
    //

    pub(crate) fn close(&mut self, reason: Option<errors::TlsError>) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.tx_scheduled = false;
        self.tx_pending = 0;
        match &reason {
            Some(err) => warn!("session closed: {}", err),
            None => debug!("session closed"),
        }
        self.close_reason = reason;
        self.downstream.close(self.close_reason.as_ref());
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close_reason(&self) -> Option<errors::TlsError> {
        self.close_reason.clone()
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.tx_ready && !self.closed
    }

    //
    // TX state machine
    //

    pub(crate) fn tx_resume(&mut self) {
        if !self.closed {
            self.tx_scheduled = true;
        }
    }

    /// Drain the one-shot TX step while it keeps rescheduling itself.
    pub(crate) fn pump(&mut self) {
        while self.tx_scheduled && !self.closed {
            self.tx_scheduled = false;
            self.tx_step();
        }
    }

    // Consume at most one pending bit per activation
    fn tx_step(&mut self) {
        if self.downstream.window() == 0 {
            return;
        }

        let (bit, result) = if self.tx_pending & TX_CLIENT_HELLO != 0 {
            (TX_CLIENT_HELLO, self.send_client_hello())
        } else if self.tx_pending & TX_CERTIFICATE != 0 {
            (TX_CERTIFICATE, self.send_certificate())
        } else if self.tx_pending & TX_CLIENT_KEY_EXCHANGE != 0 {
            (TX_CLIENT_KEY_EXCHANGE, self.send_client_key_exchange())
        } else if self.tx_pending & TX_CERTIFICATE_VERIFY != 0 {
            (TX_CERTIFICATE_VERIFY, self.send_certificate_verify())
        } else if self.tx_pending & TX_CHANGE_CIPHER != 0 {
            (TX_CHANGE_CIPHER, self.send_change_cipher())
        } else if self.tx_pending & TX_FINISHED != 0 {
            (TX_FINISHED, self.send_finished())
        } else {
            return;
        };

        match result {
            Ok(()) => {
                self.tx_pending &= !bit;
                if self.tx_pending != 0 {
                    self.tx_resume();
                }
            }
            Err(err) => self.close(Some(err)),
        }
    }

    //
    // Outbound records
    //

    /// MAC, frame and encrypt one record, then hand it downstream.
    /// Encryption runs in the scratch cipher context; the active
    /// context and sequence number only advance after the downstream
    /// delivery succeeds, so a refused write leaves the record layer
    /// untouched.
    fn send_plaintext(
        &mut self,
        rtype: ContentType,
        payload: &[u8],
    ) -> Result<(), errors::TlsError> {
        let suite = self.tx_cipherspec.suite;

        let mac_header = RecordHeader::new(rtype, self.version, payload.len())?;
        let mac = record::record_mac(
            suite.digest,
            &self.tx_cipherspec.mac_secret,
            self.tx_seq,
            &mac_header,
            payload,
        )?;

        let plaintext = if suite.cipher.is_block() {
            record::assemble_block(
                &self.rand,
                self.version,
                suite.cipher.block_size(),
                payload,
                &mac,
            )?
        } else {
            record::assemble_stream(payload, &mac)
        };

        self.tx_cipherspec.cipher_next = self.tx_cipherspec.cipher.clone();
        let ciphertext = self.tx_cipherspec.cipher_next.encrypt(&plaintext)?;

        let header = RecordHeader::new(rtype, self.version, ciphertext.len())?;
        let mut rec = header.pack();
        rec.extend_from_slice(&ciphertext);
        self.downstream.deliver(&rec)?;

        self.tx_seq += 1;
        self.tx_cipherspec.commit_cipher();
        Ok(())
    }

    fn send_handshake(&mut self, message: Vec<u8>) -> Result<(), errors::TlsError> {
        self.transcript.add(&message);
        self.send_plaintext(ContentType::Handshake, &message)
    }

    fn send_client_hello(&mut self) -> Result<(), errors::TlsError> {
        debug!("sending Client Hello for {}", self.server_name);
        let message =
            handshaker::client_hello(self.version, self.client_random, &self.server_name)?;
        self.send_handshake(message.pack())
    }

    fn send_certificate(&mut self) -> Result<(), errors::TlsError> {
        let client_certificate = self.client_certificate.clone();
        if let Some(cert_der) = &client_certificate {
            // Learn the key algorithm now and schedule CertificateVerify
            self.verify_pubkey = Some(x509::pubkey_algorithm(cert_der)?);
            self.tx_pending |= TX_CERTIFICATE_VERIFY;
            self.tx_resume();
        }
        debug!(
            "sending Certificate ({} entries)",
            client_certificate.iter().count()
        );
        let message = handshaker::certificate(client_certificate.as_deref())?;
        self.send_handshake(message.pack())
    }

    fn send_client_key_exchange(&mut self) -> Result<(), errors::TlsError> {
        let encrypted = {
            let pre_master = self
                .pre_master_secret
                .as_ref()
                .ok_or(errors::TlsError::CryptoFailure("pre-master secret consumed"))?;
            self.tx_cipherspec_pending.pubkey.encrypt(pre_master)?
        };
        debug!("sending Client Key Exchange");
        let message = handshaker::client_key_exchange(encrypted)?;
        self.send_handshake(message.pack())
    }

    fn send_certificate_verify(&mut self) -> Result<(), errors::TlsError> {
        let key_der = self
            .client_private_key
            .clone()
            .ok_or(errors::TlsError::CryptoFailure("client private key not provided"))?;
        let digest_algorithm = self.transcript.algorithm();
        let digest = self.transcript.current_digest();

        // TLSv1.2 and later carry explicit algorithm identifiers
        let sig_hash = if self.version >= record::TLS_1_2 {
            match (self.verify_pubkey, digest_algorithm) {
                (Some(PubkeyAlgorithm::Rsa), crypto::DigestAlgorithm::Sha256) => {
                    Some(handshake::RSA_SHA256_SIGNATURE)
                }
                _ => return Err(errors::TlsError::SignatureHashNotSupported),
            }
        } else {
            None
        };

        let signature = pubkey::sign_digest(&key_der, digest_algorithm, &digest)?;
        debug!("sending Certificate Verify");
        let message = handshaker::certificate_verify(sig_hash, signature)?;
        self.send_handshake(message.pack())
    }

    // Transmit Change Cipher, then change the cipher in use
    fn send_change_cipher(&mut self) -> Result<(), errors::TlsError> {
        debug!("sending Change Cipher Spec");
        self.send_plaintext(ContentType::ChangeCipherSpec, &[1])?;
        cipherspec::change_cipher(&mut self.tx_cipherspec_pending, &mut self.tx_cipherspec)?;
        self.tx_seq = 0;
        Ok(())
    }

    fn send_finished(&mut self) -> Result<(), errors::TlsError> {
        let digest = self.transcript.current_digest();
        let verify_data = crypto::verify_data(
            self.version,
            &self.master_secret[..],
            handshake::CLIENT_FINISHED_LABEL,
            &digest,
        )?;
        debug!("sending Finished");
        let message = handshaker::finished(verify_data)?;
        self.send_handshake(message.pack())
    }

    //
    // Plaintext side
    //

    pub(crate) fn window(&self) -> usize {
        // Block the window until we are ready to accept data
        if !self.is_ready() {
            return 0;
        }
        self.downstream.window()
    }

    pub(crate) fn deliver_plaintext(&mut self, data: &[u8]) -> Result<(), errors::TlsError> {
        if !self.is_ready() {
            return Err(errors::TlsError::NotConnected);
        }
        for chunk in data.chunks(record::MAX_PLAINTEXT_LEN) {
            self.send_plaintext(ContentType::ApplicationData, chunk)?;
        }
        Ok(())
    }

    pub(crate) fn take_plaintext(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.plain_rx)
    }

    //
    // Ciphertext side: header/body reassembly
    //

    pub(crate) fn deliver_ciphertext(&mut self, mut data: &[u8]) {
        while !data.is_empty() && !self.closed {
            let consumed = match self.rx_state {
                RxState::Header => {
                    let want = record::RECORD_HEADER_LEN - self.rx_rcvd;
                    let frag = want.min(data.len());
                    self.rx_header[self.rx_rcvd..self.rx_rcvd + frag]
                        .copy_from_slice(&data[..frag]);
                    self.rx_rcvd += frag;
                    if self.rx_rcvd == record::RECORD_HEADER_LEN {
                        self.rx_rcvd = 0;
                        if let Err(err) = self.process_rx_header() {
                            self.close(Some(err));
                            return;
                        }
                    }
                    frag
                }
                RxState::Body => {
                    let want = self.rx_data.len() - self.rx_rcvd;
                    let frag = want.min(data.len());
                    self.rx_data[self.rx_rcvd..self.rx_rcvd + frag]
                        .copy_from_slice(&data[..frag]);
                    self.rx_rcvd += frag;
                    if self.rx_rcvd == self.rx_data.len() {
                        self.rx_rcvd = 0;
                        if let Err(err) = self.process_rx_body() {
                            self.close(Some(err));
                            return;
                        }
                    }
                    frag
                }
            };
            data = &data[consumed..];
        }
    }

    // Allocate the body buffer now that the length is known
    fn process_rx_header(&mut self) -> Result<(), errors::TlsError> {
        let mut header = RecordHeader::empty();
        let _ = header.unpack(&mut self.rx_header.to_vec())?;
        let length = header.length.0 as usize;
        if length > record::MAX_CIPHERTEXT_LEN {
            return Err(errors::TlsError::MalformedRecord("record overflow"));
        }
        self.rx_record_header = header;
        self.rx_data = vec![0; length];
        self.rx_state = RxState::Body;
        Ok(())
    }

    fn process_rx_body(&mut self) -> Result<(), errors::TlsError> {
        let header = self.rx_record_header;
        let body = std::mem::take(&mut self.rx_data);
        self.rx_state = RxState::Header;
        self.new_ciphertext(&header, &body)?;
        // Wraps to zero for the first record after Change Cipher Spec
        self.rx_seq = self.rx_seq.wrapping_add(1);
        Ok(())
    }

    //
    // Inbound records
    //

    fn new_ciphertext(
        &mut self,
        header: &RecordHeader,
        ciphertext: &[u8],
    ) -> Result<(), errors::TlsError> {
        let suite = self.rx_cipherspec.suite;

        let plaintext = self.rx_cipherspec.cipher.decrypt(ciphertext)?;
        let (content, mac) = if suite.cipher.is_block() {
            record::split_block(
                self.version,
                suite.cipher.block_size(),
                suite.mac_len(),
                &plaintext,
            )?
        } else {
            record::split_stream(suite.mac_len(), &plaintext)?
        };

        let mac_header = RecordHeader {
            rtype: header.rtype,
            version: header.version,
            length: fields::Uint16(u16::try_from(content.len())?),
        };
        let expected = record::record_mac(
            suite.digest,
            &self.rx_cipherspec.mac_secret,
            self.rx_seq,
            &mac_header,
            &content,
        )?;
        if expected.ct_eq(&mac).unwrap_u8() != 1 {
            return Err(errors::TlsError::BadRecordMac);
        }

        self.new_record(header.rtype.0, &content)
    }

    fn new_record(&mut self, rtype: u8, data: &[u8]) -> Result<(), errors::TlsError> {
        match ContentType::from_byte(rtype) {
            Some(ContentType::ChangeCipherSpec) => self.new_change_cipher(data),
            Some(ContentType::Alert) => self.new_alert(data),
            Some(ContentType::Handshake) => self.new_handshake(data),
            Some(ContentType::ApplicationData) => {
                self.plain_rx.extend_from_slice(data);
                Ok(())
            }
            None => {
                // RFC 4346 says to just ignore unknown record types
                debug!("ignoring record type {}", rtype);
                Ok(())
            }
        }
    }

    fn new_change_cipher(&mut self, data: &[u8]) -> Result<(), errors::TlsError> {
        if data != [1] {
            return Err(errors::TlsError::InvalidChangeCipherSpec);
        }
        cipherspec::change_cipher(&mut self.rx_cipherspec_pending, &mut self.rx_cipherspec)?;
        // The post-record increment wraps this to zero
        self.rx_seq = u64::MAX;
        Ok(())
    }

    fn new_alert(&mut self, data: &[u8]) -> Result<(), errors::TlsError> {
        let alert = alert::Alert::parse(data)?;
        match alert.level() {
            Some(alert::AlertLevel::Warning) => {
                warn!(
                    "received warning alert {} ({:?})",
                    alert.description,
                    alert.description()
                );
                Ok(())
            }
            Some(alert::AlertLevel::Fatal) => Err(errors::TlsError::FatalAlert(alert.description)),
            None => Err(errors::TlsError::UnknownAlertLevel(alert.level)),
        }
    }

    // A handshake record may carry several messages back to back
    fn new_handshake(&mut self, data: &[u8]) -> Result<(), errors::TlsError> {
        let mut offset = 0;
        while offset < data.len() {
            if data.len() - offset < handshake::HANDSHAKE_PREFIX_LEN {
                return Err(errors::TlsError::InvalidLength);
            }
            let msg_type = data[offset];
            let body_len = fields::uint24_to_usize(fields::uint24_from_be_bytes([
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ]));
            let body_start = offset + handshake::HANDSHAKE_PREFIX_LEN;
            let body_end = body_start
                .checked_add(body_len)
                .ok_or(errors::TlsError::InvalidLength)?;
            if body_end > data.len() {
                return Err(errors::TlsError::InvalidLength);
            }
            let payload = &data[body_start..body_end];

            let result = match HandshakeType::from_u8(msg_type) {
                Some(HandshakeType::ServerHello) => self.new_server_hello(payload),
                Some(HandshakeType::Certificates) => self.new_certificate(payload),
                Some(HandshakeType::CertificateRequest) => self.new_certificate_request(),
                Some(HandshakeType::ServerHelloDone) => self.new_server_hello_done(payload),
                Some(HandshakeType::Finished) => self.new_finished(payload),
                _ => {
                    trace!("ignoring handshake type {}", msg_type);
                    Ok(())
                }
            };

            // Everything except Hello Request contributes to the
            // transcript, recognized or not
            if msg_type != HandshakeType::HelloRequest as u8 {
                self.transcript.add(&data[offset..body_end]);
            }

            result?;
            offset = body_end;
        }
        Ok(())
    }

    fn new_server_hello(&mut self, payload: &[u8]) -> Result<(), errors::TlsError> {
        let mut server_hello = handshake::ServerHello::empty();
        let _ = server_hello.unpack(&mut payload.to_vec())?;

        let version = server_hello.server_version;
        if version < record::TLS_1_0 {
            return Err(errors::TlsError::VersionNotSupported(version.code()));
        }
        if version > self.version {
            return Err(errors::TlsError::VersionUpgrade(version.code()));
        }
        self.version = version;
        debug!(
            "using protocol version {}.{}",
            version.major.0, version.minor.0
        );

        // MD5+SHA1 handshake verification for versions before TLSv1.2
        if self.version < record::TLS_1_2 {
            self.transcript.select_legacy();
        }

        self.server_random = Some(server_hello.random);

        let suite = suites::find(server_hello.cipher_suite).ok_or(
            errors::TlsError::CipherNotSupported(server_hello.cipher_suite.0),
        )?;
        self.tx_cipherspec_pending.set_suite(suite);
        self.rx_cipherspec_pending.set_suite(suite);
        debug!("selected cipher suite {:#06x}", suite.code.0);

        self.generate_master_secret()?;
        self.generate_keys()?;
        Ok(())
    }

    fn new_certificate(&mut self, payload: &[u8]) -> Result<(), errors::TlsError> {
        let mut certificates = handshake::Certificates::empty();
        let rest = certificates.unpack(&mut payload.to_vec())?;
        if !rest.is_empty() {
            return Err(errors::TlsError::InvalidLength);
        }

        let chain: Vec<Vec<u8>> = certificates
            .certificates
            .into_iter()
            .map(|c| c.certificate)
            .collect();
        let now = i64::try_from(
            SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)?
                .as_secs(),
        )?;
        let identity = self.verifier.verify_chain(&chain, &self.server_name, now)?;

        // The pending TX spec owns the server key until activation
        self.tx_cipherspec_pending
            .pubkey
            .init(&identity.public_key_der)?;
        debug!("server certificate chain validated");
        Ok(())
    }

    fn new_certificate_request(&mut self) -> Result<(), errors::TlsError> {
        // We can only send a single certificate, so there is no point
        // in parsing the request body
        self.tx_pending |= TX_CERTIFICATE;
        self.tx_resume();
        Ok(())
    }

    fn new_server_hello_done(&mut self, payload: &[u8]) -> Result<(), errors::TlsError> {
        if !payload.is_empty() {
            return Err(errors::TlsError::InvalidLength);
        }
        self.tx_pending |= TX_CLIENT_KEY_EXCHANGE | TX_CHANGE_CIPHER | TX_FINISHED;
        self.tx_resume();
        Ok(())
    }

    fn new_finished(&mut self, payload: &[u8]) -> Result<(), errors::TlsError> {
        if payload.len() != crypto::VERIFY_DATA_LENGTH {
            return Err(errors::TlsError::InvalidLength);
        }

        let digest = self.transcript.current_digest();
        let expected = crypto::verify_data(
            self.version,
            &self.master_secret[..],
            handshake::SERVER_FINISHED_LABEL,
            &digest,
        )?;
        if expected.ct_eq(payload).unwrap_u8() != 1 {
            return Err(errors::TlsError::FinishedMismatch);
        }

        // The pre-master secret has no further use
        self.pre_master_secret = None;
        self.tx_ready = true;
        debug!("handshake complete, ready for application data");
        Ok(())
    }

    //
    // Secret management
    //

    fn generate_master_secret(&mut self) -> Result<(), errors::TlsError> {
        let pre_master = self
            .pre_master_secret
            .as_ref()
            .ok_or(errors::TlsError::CryptoFailure("pre-master secret consumed"))?;
        let server_random = self
            .server_random
            .ok_or(errors::TlsError::CryptoFailure("server random missing"))?;
        let master = crypto::master_secret(
            self.version,
            pre_master,
            &self.client_random.pack(),
            &server_random.pack(),
        )?;
        self.master_secret = Zeroizing::new(master);
        Ok(())
    }

    /// Slice the key block into TX/RX MAC secrets, keys and IVs and
    /// install them into the pending cipher specs.
    fn generate_keys(&mut self) -> Result<(), errors::TlsError> {
        let suite = self.tx_cipherspec_pending.suite;
        let hash_size = suite.mac_len();
        let key_size = suite.key_len();
        let iv_size = suite.cipher.block_size();
        let total = 2 * (hash_size + key_size + iv_size);

        let server_random = self
            .server_random
            .ok_or(errors::TlsError::CryptoFailure("server random missing"))?;
        let key_block = Zeroizing::new(crypto::key_block(
            self.version,
            &self.master_secret[..],
            &server_random.pack(),
            &self.client_random.pack(),
            total,
        )?);

        let mut key = key_block.as_slice();
        self.tx_cipherspec_pending.set_mac_secret(&key[..hash_size]);
        key = &key[hash_size..];
        self.rx_cipherspec_pending.set_mac_secret(&key[..hash_size]);
        key = &key[hash_size..];
        self.tx_cipherspec_pending.cipher.set_key(&key[..key_size])?;
        key = &key[key_size..];
        self.rx_cipherspec_pending.cipher.set_key(&key[..key_size])?;
        key = &key[key_size..];
        self.tx_cipherspec_pending.cipher.set_iv(&key[..iv_size])?;
        key = &key[iv_size..];
        self.rx_cipherspec_pending.cipher.set_iv(&key[..iv_size])?;
        Ok(())
    }
}
