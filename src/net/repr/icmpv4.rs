use byteorder::{
    ByteOrder,
    NetworkEndian,
};

use crate::net::check::internet_checksum;
use crate::{
    Error,
    Result,
};

/// ICMP message types understood by the stack.
pub mod msg_types {
    pub const ECHO_REPLY: u8 = 0;

    pub const ECHO_REQUEST: u8 = 8;
}

/// Safe representation of an ICMP echo message header.
///
/// Other messages (unreachable, time exceeded, etc.) are never answered, so
/// they have no representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repr {
    EchoReply { id: u16, seq: u16 },
    EchoRequest { id: u16, seq: u16 },
}

impl Repr {
    /// Returns the ICMP packet size needed to serialize this ICMP
    /// representation, excluding any payload.
    pub fn buffer_len(&self) -> usize {
        Packet::<&[u8]>::HEADER_LEN
    }

    /// Tries to deserialize a packet into an ICMP representation.
    ///
    /// Returns Error::Ignored for well formed messages which are not echo
    /// requests or replies.
    pub fn deserialize<T>(packet: &Packet<T>) -> Result<Repr>
    where
        T: AsRef<[u8]>,
    {
        if packet.code() != 0 {
            return Err(Error::Ignored);
        }

        let (id, seq) = (packet.ident(), packet.seq_num());

        match packet.msg_type() {
            msg_types::ECHO_REPLY => Ok(Repr::EchoReply { id, seq }),
            msg_types::ECHO_REQUEST => Ok(Repr::EchoRequest { id, seq }),
            _ => Err(Error::Ignored),
        }
    }

    /// Serializes the ICMP representation into a packet.
    ///
    /// The checksum covers the payload, so the payload should be written
    /// before serializing the header.
    pub fn serialize<T>(&self, packet: &mut Packet<T>)
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        let (msg_type, id, seq) = match *self {
            Repr::EchoReply { id, seq } => (msg_types::ECHO_REPLY, id, seq),
            Repr::EchoRequest { id, seq } => (msg_types::ECHO_REQUEST, id, seq),
        };

        packet.set_msg_type(msg_type);
        packet.set_code(0);
        packet.set_ident(id);
        packet.set_seq_num(seq);
        packet.fill_checksum();
    }
}

/// Echo message layout, see RFC 792.
mod fields {
    use core::ops::{
        Range,
        RangeFrom,
    };

    pub const MSG_TYPE: usize = 0;

    pub const CODE: usize = 1;

    pub const CHECKSUM: Range<usize> = 2 .. 4;

    pub const IDENT: Range<usize> = 4 .. 6;

    pub const SEQ_NUM: Range<usize> = 6 .. 8;

    pub const PAYLOAD: RangeFrom<usize> = 8 ..;
}

/// View of a byte buffer as an ICMP echo packet.
#[derive(Debug)]
pub struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Packet<T> {
    pub const HEADER_LEN: usize = 8;

    /// Tries to create an ICMP packet view over a byte buffer.
    pub fn try_new(buffer: T) -> Result<Packet<T>> {
        if buffer.as_ref().len() < Self::HEADER_LEN {
            Err(Error::Exhausted)
        } else {
            Ok(Packet { buffer })
        }
    }

    /// Returns the length of an ICMP packet with the specified payload size.
    pub fn buffer_len(payload_len: usize) -> usize {
        Self::HEADER_LEN + payload_len
    }

    /// Checks the checksum over the whole message.
    pub fn check_encoding(&self) -> Result<()> {
        match self.gen_packet_checksum() {
            0 => Ok(()),
            _ => Err(Error::Checksum),
        }
    }

    pub fn gen_packet_checksum(&self) -> u16 {
        internet_checksum(self.buffer.as_ref().iter().cloned())
    }

    pub fn msg_type(&self) -> u8 {
        self.buffer.as_ref()[fields::MSG_TYPE]
    }

    pub fn code(&self) -> u8 {
        self.buffer.as_ref()[fields::CODE]
    }

    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::CHECKSUM])
    }

    pub fn ident(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::IDENT])
    }

    pub fn seq_num(&self) -> u16 {
        NetworkEndian::read_u16(&self.buffer.as_ref()[fields::SEQ_NUM])
    }

    pub fn payload(&self) -> &[u8] {
        &self.buffer.as_ref()[fields::PAYLOAD]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    pub fn set_msg_type(&mut self, msg_type: u8) {
        self.buffer.as_mut()[fields::MSG_TYPE] = msg_type;
    }

    pub fn set_code(&mut self, code: u8) {
        self.buffer.as_mut()[fields::CODE] = code;
    }

    pub fn set_checksum(&mut self, checksum: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[fields::CHECKSUM], checksum);
    }

    pub fn set_ident(&mut self, ident: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[fields::IDENT], ident);
    }

    pub fn set_seq_num(&mut self, seq_num: u16) {
        NetworkEndian::write_u16(&mut self.buffer.as_mut()[fields::SEQ_NUM], seq_num);
    }

    /// Recomputes the checksum over the header and payload.
    pub fn fill_checksum(&mut self) {
        self.set_checksum(0);
        let checksum = self.gen_packet_checksum();
        self.set_checksum(checksum);
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[fields::PAYLOAD]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_buffer_too_small() {
        let buffer: [u8; 7] = [0; 7];
        assert_matches!(Packet::try_new(&buffer[..]), Err(Error::Exhausted));
    }

    #[test]
    fn test_packet_with_empty_payload() {
        let buffer: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_eq!(packet.payload().len(), 0);
    }

    #[test]
    fn test_packet_with_invalid_checksum() {
        let buffer: [u8; 9] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];
        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_matches!(packet.check_encoding(), Err(Error::Checksum));
    }

    #[test]
    fn test_packet_getters() {
        let buffer: [u8; 9] = [0x01, 0x02, 0xE9, 0xEF, 0x05, 0x06, 0x07, 0x08, 0x09];
        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_matches!(packet.check_encoding(), Ok(_));
        assert_eq!(packet.msg_type(), 1);
        assert_eq!(packet.code(), 2);
        assert_eq!(packet.checksum(), 59887);
        assert_eq!(packet.ident(), 0x0506);
        assert_eq!(packet.seq_num(), 0x0708);
        assert_eq!(packet.payload(), [0x09]);
    }

    #[test]
    fn test_packet_setters() {
        let mut buffer: [u8; 9] = [0; 9];

        {
            let mut packet = Packet::try_new(&mut buffer[..]).unwrap();
            packet.set_msg_type(1);
            packet.set_code(2);
            packet.set_checksum(772);
            packet.set_ident(0x0506);
            packet.set_seq_num(0x0708);
            packet.payload_mut()[0] = 0x09;
        }

        assert_eq!(
            &buffer[..],
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09][..]
        );
    }

    #[test]
    fn test_echo_request_deserialize() {
        let mut buffer: [u8; 12] = [
            0x08, 0x00, 0x00, 0x00, 0x12, 0x34, 0x00, 0x07, 0xDE, 0xAD, 0xBE, 0xEF,
        ];
        Packet::try_new(&mut buffer[..]).unwrap().fill_checksum();

        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_matches!(packet.check_encoding(), Ok(_));
        assert_eq!(
            Repr::deserialize(&packet).unwrap(),
            Repr::EchoRequest {
                id: 0x1234,
                seq: 7,
            }
        );
        assert_eq!(packet.payload(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_echo_with_nonzero_code_ignored() {
        let buffer: [u8; 8] = [0x08, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01];
        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_matches!(Repr::deserialize(&packet), Err(Error::Ignored));
    }

    #[test]
    fn test_unsupported_message_ignored() {
        // Destination unreachable, port unreachable.
        let buffer: [u8; 8] = [0x03, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let packet = Packet::try_new(&buffer[..]).unwrap();
        assert_matches!(Repr::deserialize(&packet), Err(Error::Ignored));
    }

    #[test]
    fn test_echo_reply_serialize() {
        let mut buffer: [u8; 10] = [0; 10];

        {
            let mut packet = Packet::try_new(&mut buffer[..]).unwrap();
            packet.payload_mut().copy_from_slice(&[0xAB, 0xCD]);
            Repr::EchoReply { id: 1, seq: 2 }.serialize(&mut packet);
            assert_matches!(packet.check_encoding(), Ok(_));
        }

        assert_eq!(&buffer[.. 8], &[0x00, 0x00, 0x54, 0x2F, 0x00, 0x01, 0x00, 0x02]);
    }
}
