//! The fourteen MQTT control-packet equivalents carried by SMP.
//!
//! Each type is either an establishment message (CONNECT / CONNACK, signed and
//! sent in the clear) or a control message. Control messages are authenticated
//! with AES-GCM; PUBLISH, SUBSCRIBE, SUBACK and UNSUBSCRIBE additionally have
//! their inner packet encrypted.

use super::errors::WireError;
use super::role::{Direction, Role};

/// Length of a direction-and-type AAD label (`C2B_PUBLIS`, `B2C_SUBACK`, ...).
pub const AUTH_LABEL_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum MessageType {
    Connect = 1,
    Connack = 2,
    Publish = 3,
    Puback = 4,
    Pubrec = 5,
    Pubrel = 6,
    Pubcomp = 7,
    Subscribe = 8,
    Suback = 9,
    Unsubscribe = 10,
    Unsuback = 11,
    Pingreq = 12,
    Pingresp = 13,
    Disconnect = 14,
}

impl MessageType {
    pub const ALL: [MessageType; 14] = [
        MessageType::Connect,
        MessageType::Connack,
        MessageType::Publish,
        MessageType::Puback,
        MessageType::Pubrec,
        MessageType::Pubrel,
        MessageType::Pubcomp,
        MessageType::Subscribe,
        MessageType::Suback,
        MessageType::Unsubscribe,
        MessageType::Unsuback,
        MessageType::Pingreq,
        MessageType::Pingresp,
        MessageType::Disconnect,
    ];

    #[must_use]
    pub const fn code(self) -> u64 {
        self as u64
    }

    /// Upper-case MQTT name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MessageType::Connect => "CONNECT",
            MessageType::Connack => "CONNACK",
            MessageType::Publish => "PUBLISH",
            MessageType::Puback => "PUBACK",
            MessageType::Pubrec => "PUBREC",
            MessageType::Pubrel => "PUBREL",
            MessageType::Pubcomp => "PUBCOMP",
            MessageType::Subscribe => "SUBSCRIBE",
            MessageType::Suback => "SUBACK",
            MessageType::Unsubscribe => "UNSUBSCRIBE",
            MessageType::Unsuback => "UNSUBACK",
            MessageType::Pingreq => "PINGREQ",
            MessageType::Pingresp => "PINGRESP",
            MessageType::Disconnect => "DISCONNECT",
        }
    }

    /// The establishment message a role sends: CONNECT for the initiator,
    /// CONNACK for the responder.
    #[must_use]
    pub const fn establishment_for(role: Role) -> MessageType {
        match role {
            Role::Initiator => MessageType::Connect,
            Role::Responder => MessageType::Connack,
        }
    }

    #[must_use]
    pub const fn is_establishment(self) -> bool {
        matches!(self, MessageType::Connect | MessageType::Connack)
    }

    /// Whether the inner packet of a control message of this type is encrypted
    /// rather than only authenticated.
    #[must_use]
    pub const fn is_encrypted(self) -> bool {
        matches!(
            self,
            MessageType::Publish
                | MessageType::Subscribe
                | MessageType::Suback
                | MessageType::Unsubscribe
        )
    }

    /// Whether `role` is allowed to send this type.
    #[must_use]
    pub const fn sent_by(self, role: Role) -> bool {
        match self {
            MessageType::Connect
            | MessageType::Subscribe
            | MessageType::Unsubscribe
            | MessageType::Pingreq => matches!(role, Role::Initiator),
            MessageType::Connack
            | MessageType::Suback
            | MessageType::Unsuback
            | MessageType::Pingresp => matches!(role, Role::Responder),
            MessageType::Publish
            | MessageType::Puback
            | MessageType::Pubrec
            | MessageType::Pubrel
            | MessageType::Pubcomp
            | MessageType::Disconnect => true,
        }
    }

    /// Whether a session in `role` accepts this type from its peer.
    #[must_use]
    pub const fn received_by(self, role: Role) -> bool {
        self.sent_by(role.peer())
    }

    /// The 10-byte label binding type and direction into the AAD:
    /// the direction prefix followed by the first six characters of the name,
    /// right-padded with `_` for shorter names.
    #[must_use]
    pub fn auth_label(self, direction: Direction) -> [u8; AUTH_LABEL_LEN] {
        let mut label = [b'_'; AUTH_LABEL_LEN];
        let prefix = direction.label_prefix();
        label[..prefix.len()].copy_from_slice(prefix);
        for (dst, src) in label[prefix.len()..]
            .iter_mut()
            .zip(self.name().as_bytes())
        {
            *dst = *src;
        }
        label
    }
}

impl TryFrom<u64> for MessageType {
    type Error = WireError;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        MessageType::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or(WireError::UnknownMessageType(code))
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
