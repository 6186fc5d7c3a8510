use super::errors::WireError;
use super::message_type::MessageType;
use super::{CLIENT_ID_MAX_LEN, MESSAGE_CONTEXT_SMP_MQTT, MESSAGE_CONTEXT_VERSION};
use crate::core::cbor::{CborSeqReader, CborSeqWriter};

/// Header carried (in encoded form) at the front of every SMP message.
///
/// Wire form is a five-item CBOR sequence:
/// `[context: uint][context_version: uint][type: uint][client_id: text][message_id: uint]`.
/// The encoded bytes, not the struct, are what gets signed and authenticated,
/// so callers keep the exact encoding they produced or received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmpHeader {
    pub context: u64,
    pub context_version: u64,
    pub message_type: MessageType,
    pub client_id: String,
    pub message_id: u64,
}

impl SmpHeader {
    /// Header for the SMP-over-MQTT context at the current version.
    ///
    /// # Errors
    /// [`WireError::ClientIdLength`] if `client_id` is empty or too long.
    pub fn new(
        message_type: MessageType,
        client_id: &str,
        message_id: u64,
    ) -> Result<Self, WireError> {
        check_client_id(client_id)?;
        Ok(Self {
            context: MESSAGE_CONTEXT_SMP_MQTT,
            context_version: MESSAGE_CONTEXT_VERSION,
            message_type,
            client_id: client_id.to_owned(),
            message_id,
        })
    }

    /// # Errors
    /// [`WireError::Codec`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut w = CborSeqWriter::new();
        w.uint(self.context)?
            .uint(self.context_version)?
            .uint(self.message_type.code())?
            .text(&self.client_id)?
            .uint(self.message_id)?;
        Ok(w.finish())
    }

    /// Decode a complete encoded header.
    ///
    /// Context and version are returned as found; checking them against the
    /// supported values is the receiver's job.
    ///
    /// # Errors
    /// Codec errors, [`WireError::UnknownMessageType`] or
    /// [`WireError::ClientIdLength`].
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut r = CborSeqReader::new(bytes);
        let context = r.uint("messageContext")?;
        let context_version = r.uint("messageContextVersion")?;
        let message_type = MessageType::try_from(r.uint("messageType")?)?;
        let client_id = r.text("clientId")?;
        let message_id = r.uint("messageId")?;
        r.finish()?;
        check_client_id(&client_id)?;
        Ok(Self {
            context,
            context_version,
            message_type,
            client_id,
            message_id,
        })
    }

    /// Decode only the header of an SMP wire message.
    ///
    /// Both establishment and control messages start with the encoded header
    /// as a byte-string item, so the rest of the buffer is left untouched.
    /// Returns the header together with its encoded bytes.
    ///
    /// # Errors
    /// As [`SmpHeader::decode`], plus codec errors for the leading item.
    pub fn peek(wire: &[u8]) -> Result<(Self, Vec<u8>), WireError> {
        let encoded = CborSeqReader::new(wire).bytes("encodedHeader")?;
        let header = Self::decode(&encoded)?;
        Ok((header, encoded))
    }
}

fn check_client_id(client_id: &str) -> Result<(), WireError> {
    if client_id.is_empty() || client_id.len() > CLIENT_ID_MAX_LEN {
        return Err(WireError::ClientIdLength {
            max: CLIENT_ID_MAX_LEN,
            actual: client_id.len(),
        });
    }
    Ok(())
}
