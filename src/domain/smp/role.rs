/// Protocol polarity of a session.
///
/// The initiator opens the handshake with CONNECT (an MQTT client); the
/// responder completes it with CONNACK (an MQTT broker). Both roles can live in
/// one process, so the role is carried by each session rather than fixed at
/// build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Initiator,
    Responder,
}

/// Travel direction of a message, named from the broker's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client (initiator) to broker (responder).
    ClientToBroker,
    /// Broker (responder) to client (initiator).
    BrokerToClient,
}

impl Role {
    /// The role on the other end of the session.
    #[must_use]
    pub const fn peer(self) -> Role {
        match self {
            Role::Initiator => Role::Responder,
            Role::Responder => Role::Initiator,
        }
    }

    /// Direction of messages this role sends.
    #[must_use]
    pub const fn outbound(self) -> Direction {
        match self {
            Role::Initiator => Direction::ClientToBroker,
            Role::Responder => Direction::BrokerToClient,
        }
    }

    /// Direction of messages this role receives.
    #[must_use]
    pub const fn inbound(self) -> Direction {
        self.peer().outbound()
    }
}

impl Direction {
    /// Four-byte label prefix used in control-message AAD.
    #[must_use]
    pub const fn label_prefix(self) -> &'static [u8; 4] {
        match self {
            Direction::ClientToBroker => b"C2B_",
            Direction::BrokerToClient => b"B2C_",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_is_an_involution() {
        for r in [Role::Initiator, Role::Responder] {
            assert_ne!(r.peer(), r);
            assert_eq!(r.peer().peer(), r);
        }
    }

    #[test]
    fn inbound_mirrors_peer_outbound() {
        assert_eq!(Role::Initiator.outbound(), Direction::ClientToBroker);
        assert_eq!(Role::Initiator.inbound(), Direction::BrokerToClient);
        assert_eq!(Role::Responder.inbound(), Role::Initiator.outbound());
    }
}
