use crate::domain::smp::AUTH_LABEL_LEN;

/// Construct the AAD for a secured control message:
/// `encodedHeader ‖ label ‖ [cleartext packet]`.
///
/// `cleartext_packet` is `Some` for authenticated-only types, whose packet
/// travels in the clear and is bound through the AAD instead of the
/// ciphertext; encrypted types pass `None`.
#[must_use]
pub fn control_aad(
    encoded_header: &[u8],
    label: &[u8; AUTH_LABEL_LEN],
    cleartext_packet: Option<&[u8]>,
) -> Vec<u8> {
    let packet = cleartext_packet.unwrap_or_default();
    let mut aad = Vec::with_capacity(encoded_header.len() + AUTH_LABEL_LEN + packet.len());
    aad.extend_from_slice(encoded_header);
    aad.extend_from_slice(label);
    aad.extend_from_slice(packet);
    aad
}
