//! Group telegrams: decoding routed `L_Data.ind` datagrams and building them.
//!
//! [`Telegram::parse`] turns one captured datagram into a [`Telegram`] or
//! rejects it; [`TelegramBuilder`] writes the symmetric frame for sending.
//!
//! ## Example
//!
//! ```rust
//! use knx_ip_node::ga;
//! use knx_ip_node::protocol::cemi::CommandType;
//! use knx_ip_node::protocol::telegram::{Telegram, TelegramBuilder};
//! use knx_ip_node::IndividualAddress;
//!
//! let mut buf = [0u8; 64];
//! let len = TelegramBuilder::new(IndividualAddress::pack(1, 1, 0), ga!(10/6/5))
//!     .command(CommandType::Write)
//!     .payload(&[0x01])
//!     .build_into(&mut buf)
//!     .unwrap();
//!
//! let telegram = Telegram::parse(&buf[..len]).unwrap();
//! assert_eq!(telegram.destination, ga!(10/6/5));
//! assert_eq!(telegram.command, CommandType::Write);
//! assert!(telegram.as_bool().unwrap());
//! ```

use heapless::Vec;

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::dpt::dpt9;
use crate::dpt::value::{Color, Date, TimeOfDay};
use crate::error::{KnxError, Result};
use crate::protocol::cemi::{CommandType, ControlField1, ControlField2};
use crate::protocol::constants::{CEMIMessageCode, ServiceType, MAX_PAYLOAD_SIZE};
use crate::protocol::frame::{KnxnetIpFrame, KnxnetIpHeader};

/// Bytes of a built frame that are not payload: header, message code,
/// additional info length, two control bytes, two addresses, data length,
/// TPCI/APCI byte and the trailing checksum.
pub const FRAME_OVERHEAD: usize = KnxnetIpHeader::SIZE + 2 + 8 + 1;

/// Maximum text length carried by a 14-byte string value.
pub const MAX_TEXT_LEN: usize = 14;

/// A decoded group telegram.
///
/// The first payload byte has its two top bits cleared; those bits belong
/// to [`CommandType`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telegram {
    /// Sending device
    pub source: IndividualAddress,
    /// Target group
    pub destination: GroupAddress,
    /// Application-layer command
    pub command: CommandType,
    /// Data bytes, exactly the frame's declared data length
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
    /// Control field 1 as received
    pub ctrl1: ControlField1,
    /// Remaining routing hops
    pub hop_count: u8,
    /// Extended frame format nibble of control field 2
    pub extended_format: u8,
    /// Number of additional info bytes that were skipped
    pub additional_info_len: u8,
}

/// Bounds-checked big-endian reader over a datagram body.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or_else(KnxError::invalid_frame)?;
        let bytes = self.data.get(self.pos..end).ok_or_else(KnxError::invalid_frame)?;
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16_be(&mut self) -> Result<[u8; 2]> {
        let bytes = self.take(2)?;
        Ok([bytes[0], bytes[1]])
    }
}

fn reject(reason: &str, err: KnxError) -> KnxError {
    knx_log!(debug, "telegram rejected: {}", reason);
    err
}

impl Telegram {
    /// Decode one datagram.
    ///
    /// Only `ROUTING_INDICATION` frames carrying `L_Data.ind` to a group
    /// address are accepted. Nothing is returned for a rejected datagram.
    ///
    /// # Errors
    ///
    /// Returns a protocol error naming the first check that failed.
    pub fn parse(datagram: &[u8]) -> Result<Self> {
        let frame = KnxnetIpFrame::parse(datagram).map_err(|e| reject("header", e))?;
        if frame.service_type() != ServiceType::RoutingIndication {
            return Err(reject("service type", KnxError::unsupported_service_type()));
        }

        let mut reader = Reader::new(frame.body());

        let code = reader.u8().map_err(|e| reject("truncated", e))?;
        if CEMIMessageCode::from_u8(code) != Some(CEMIMessageCode::LDataInd) {
            return Err(reject("message code", KnxError::invalid_message_code()));
        }

        let additional_info_len = reader.u8().map_err(|e| reject("truncated", e))?;
        reader
            .take(usize::from(additional_info_len))
            .map_err(|e| reject("additional info", e))?;

        let ctrl1 = ControlField1::from(reader.u8().map_err(|e| reject("truncated", e))?);
        let ctrl2 = ControlField2::from(reader.u8().map_err(|e| reject("truncated", e))?);
        if !ctrl2.is_group_address() {
            return Err(reject("individual destination", KnxError::individual_destination()));
        }

        let source = IndividualAddress::from_bytes(reader.u16_be().map_err(|e| reject("truncated", e))?);
        let destination = GroupAddress::from_bytes(reader.u16_be().map_err(|e| reject("truncated", e))?);

        let data_len = usize::from(reader.u8().map_err(|e| reject("truncated", e))?);
        if data_len == 0 {
            return Err(reject("empty data", KnxError::invalid_frame()));
        }
        if data_len > MAX_PAYLOAD_SIZE {
            return Err(reject("data length", KnxError::payload_too_large()));
        }

        let apci = reader.u8().map_err(|e| reject("truncated", e))?;
        let data = reader.take(data_len).map_err(|e| reject("truncated payload", e))?;

        let command = CommandType::from_wire(apci, data[0]);
        let mut payload: Vec<u8, MAX_PAYLOAD_SIZE> = Vec::new();
        payload
            .extend_from_slice(data)
            .map_err(|_overflow| KnxError::payload_too_large())?;
        payload[0] &= 0x3F;

        Ok(Self {
            source,
            destination,
            command,
            payload,
            ctrl1,
            hop_count: ctrl2.hop_count(),
            extended_format: ctrl2.extended_format(),
            additional_info_len,
        })
    }

    /// Builder that re-encodes this telegram from `source`.
    pub fn to_builder(&self, source: IndividualAddress) -> TelegramBuilder<'_> {
        TelegramBuilder::new(source, self.destination)
            .command(self.command)
            .payload(&self.payload)
    }

    /// Value bytes after the leading APCI-carrying byte.
    fn value_bytes<const N: usize>(&self) -> Result<[u8; N]> {
        self.payload
            .get(1..=N)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(KnxError::invalid_dpt_data)
    }

    fn short_value(&self) -> Result<u8> {
        self.payload.first().copied().ok_or_else(KnxError::invalid_dpt_data)
    }

    /// 1-bit value from the low bit of the first byte.
    pub fn as_bool(&self) -> Result<bool> {
        Ok(self.short_value()? & 0x01 != 0)
    }

    /// 2-bit value from the first byte.
    pub fn as_two_bit(&self) -> Result<u8> {
        Ok(self.short_value()? & 0x03)
    }

    /// 4-bit value from the first byte.
    pub fn as_four_bit(&self) -> Result<u8> {
        Ok(self.short_value()? & 0x0F)
    }

    /// Unsigned 8-bit value.
    pub fn as_u8(&self) -> Result<u8> {
        self.value_bytes::<1>().map(|[b]| b)
    }

    /// Signed 8-bit value.
    pub fn as_i8(&self) -> Result<i8> {
        self.value_bytes::<1>().map(|[b]| b as i8)
    }

    /// Unsigned 16-bit value (big-endian).
    pub fn as_u16(&self) -> Result<u16> {
        self.value_bytes().map(u16::from_be_bytes)
    }

    /// Signed 16-bit value (big-endian).
    pub fn as_i16(&self) -> Result<i16> {
        self.value_bytes().map(i16::from_be_bytes)
    }

    /// DPT 9 two-byte float.
    pub fn as_float2(&self) -> Result<f32> {
        dpt9::decode_float(self.value_bytes()?)
    }

    /// Unsigned 32-bit value (big-endian).
    pub fn as_u32(&self) -> Result<u32> {
        self.value_bytes().map(u32::from_be_bytes)
    }

    /// Signed 32-bit value (big-endian).
    pub fn as_i32(&self) -> Result<i32> {
        self.value_bytes().map(i32::from_be_bytes)
    }

    /// IEEE 754 single precision float (big-endian).
    pub fn as_float4(&self) -> Result<f32> {
        self.value_bytes().map(f32::from_be_bytes)
    }

    /// Time of day (DPT 10).
    pub fn as_time(&self) -> Result<TimeOfDay> {
        Ok(TimeOfDay::from_bytes(self.value_bytes()?))
    }

    /// Calendar date (DPT 11).
    pub fn as_date(&self) -> Result<Date> {
        Ok(Date::from_bytes(self.value_bytes()?))
    }

    /// RGB color (DPT 232).
    pub fn as_color(&self) -> Result<Color> {
        Ok(Color::from_bytes(self.value_bytes()?))
    }

    /// Text up to the first NUL of a 14-byte string (DPT 16).
    pub fn as_text(&self) -> Result<&str> {
        let bytes = self.payload.get(1..).ok_or_else(KnxError::invalid_dpt_data)?;
        let bytes = &bytes[..bytes.len().min(MAX_TEXT_LEN)];
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        core::str::from_utf8(&bytes[..end]).map_err(|_utf8| KnxError::invalid_dpt_data())
    }
}

/// Builder for one outgoing group-addressed routing indication.
#[derive(Debug, Clone, Copy)]
pub struct TelegramBuilder<'a> {
    source: IndividualAddress,
    destination: GroupAddress,
    command: CommandType,
    payload: &'a [u8],
}

impl<'a> TelegramBuilder<'a> {
    /// New group write from `source` to `destination` with no payload yet.
    pub const fn new(source: IndividualAddress, destination: GroupAddress) -> Self {
        Self {
            source,
            destination,
            command: CommandType::Write,
            payload: &[],
        }
    }

    /// Set the command type.
    #[must_use]
    pub const fn command(mut self, command: CommandType) -> Self {
        self.command = command;
        self
    }

    /// Set the payload. The top two bits of byte 0 are overwritten by the command.
    #[must_use]
    pub const fn payload(mut self, payload: &'a [u8]) -> Self {
        self.payload = payload;
        self
    }

    /// Size of the frame [`build_into`](Self::build_into) writes.
    pub const fn frame_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Encode the frame into `buf`, returning its length.
    ///
    /// # Errors
    ///
    /// - addressing error when the destination is group address 0
    /// - protocol error for an empty payload or one above the maximum APDU size
    /// - transport error when `buf` is too small
    pub fn build_into(&self, buf: &mut [u8]) -> Result<usize> {
        if self.destination.raw() == 0 {
            return Err(KnxError::invalid_group_address());
        }
        if self.payload.is_empty() {
            return Err(KnxError::invalid_frame());
        }
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(KnxError::payload_too_large());
        }

        let len = self.frame_len();
        let out = buf.get_mut(..len).ok_or_else(KnxError::buffer_too_small)?;

        let header = KnxnetIpHeader::new(ServiceType::RoutingIndication, (len - KnxnetIpHeader::SIZE) as u16);
        let mut pos = header.encode(out)?;

        let src = self.source.to_bytes();
        let dst = self.destination.to_bytes();
        let cemi = [
            CEMIMessageCode::LDataInd.to_u8(),
            0x00,
            ControlField1::ROUTED_GROUP.raw(),
            ControlField2::default().raw(),
            src[0],
            src[1],
            dst[0],
            dst[1],
            self.payload.len() as u8,
            self.command.apci_bits(),
        ];
        out[pos..pos + cemi.len()].copy_from_slice(&cemi);
        pos += cemi.len();

        let data = &mut out[pos..pos + self.payload.len()];
        data.copy_from_slice(self.payload);
        data[0] = (data[0] & 0x3F) | self.command.data_bits();
        pos += self.payload.len();

        out[pos] = out[..pos].iter().fold(0u8, |acc, b| acc ^ b);

        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga;

    fn routed(cemi: &[u8]) -> std::vec::Vec<u8> {
        let mut frame = vec![0x06, 0x10, 0x05, 0x30, 0x00, (6 + cemi.len()) as u8];
        frame.extend_from_slice(cemi);
        frame
    }

    // switch on, 1.1.160 -> 10/6/5
    const SWITCH_ON: [u8; 11] = [0x29, 0x00, 0xBC, 0xE0, 0x11, 0xA0, 0x56, 0x05, 0x01, 0x00, 0x81];

    #[test]
    fn test_parse_group_write() {
        let t = Telegram::parse(&routed(&SWITCH_ON)).unwrap();
        assert_eq!(t.source, IndividualAddress::pack(1, 1, 160));
        assert_eq!(t.destination, ga!(10 / 6 / 5));
        assert_eq!(t.command, CommandType::Write);
        assert_eq!(t.payload.as_slice(), &[0x01]);
        assert_eq!(t.hop_count, 6);
        assert_eq!(t.additional_info_len, 0);
        assert!(t.as_bool().unwrap());
    }

    #[test]
    fn test_parse_skips_additional_info() {
        let cemi = [0x29, 0x02, 0xAA, 0xBB, 0xBC, 0xE0, 0x11, 0xA0, 0x56, 0x05, 0x01, 0x00, 0x40];
        let t = Telegram::parse(&routed(&cemi)).unwrap();
        assert_eq!(t.additional_info_len, 2);
        assert_eq!(t.command, CommandType::Answer);
        assert_eq!(t.payload.as_slice(), &[0x00]);
    }

    #[test]
    fn test_parse_rejects_wrong_service() {
        let mut frame = routed(&SWITCH_ON);
        frame[3] = 0x31;
        let err = Telegram::parse(&frame).unwrap_err();
        assert!(matches!(err, KnxError::Protocol(e) if e.is_unsupported_service_type()));
    }

    #[test]
    fn test_parse_rejects_message_code() {
        let mut cemi = SWITCH_ON;
        cemi[0] = 0x11;
        let err = Telegram::parse(&routed(&cemi)).unwrap_err();
        assert!(matches!(err, KnxError::Protocol(e) if e.is_invalid_message_code()));
    }

    #[test]
    fn test_parse_rejects_individual_destination() {
        let mut cemi = SWITCH_ON;
        cemi[3] = 0x60;
        let err = Telegram::parse(&routed(&cemi)).unwrap_err();
        assert!(matches!(err, KnxError::Protocol(e) if e.is_individual_destination()));
    }

    #[test]
    fn test_parse_rejects_truncation() {
        let frame = routed(&SWITCH_ON);
        for cut in 0..frame.len() {
            assert!(Telegram::parse(&frame[..cut]).is_err(), "accepted {} bytes", cut);
        }
    }

    #[test]
    fn test_parse_rejects_data_length() {
        let mut cemi = SWITCH_ON;
        cemi[8] = 0;
        assert!(Telegram::parse(&routed(&cemi)).is_err());

        cemi[8] = (MAX_PAYLOAD_SIZE + 1) as u8;
        let err = Telegram::parse(&routed(&cemi)).unwrap_err();
        assert!(matches!(err, KnxError::Protocol(e) if e.is_payload_too_large()));
    }

    #[test]
    fn test_build_matches_wire_layout() {
        let mut buf = [0u8; 32];
        let len = TelegramBuilder::new(IndividualAddress::pack(1, 1, 160), ga!(10 / 6 / 5))
            .payload(&[0x01])
            .build_into(&mut buf)
            .unwrap();
        assert_eq!(len, FRAME_OVERHEAD + 1);

        let mut expected = routed(&SWITCH_ON);
        expected[5] += 1;
        let checksum = expected.iter().fold(0u8, |acc, b| acc ^ b);
        expected.push(checksum);
        assert_eq!(&buf[..len], expected.as_slice());
    }

    #[test]
    fn test_build_rejects_group_zero() {
        let mut buf = [0u8; 32];
        let err = TelegramBuilder::new(IndividualAddress::default(), GroupAddress::from(0))
            .payload(&[0x01])
            .build_into(&mut buf)
            .unwrap_err();
        assert!(matches!(err, KnxError::Addressing(e) if e.is_invalid_group_address()));
    }

    #[test]
    fn test_build_rejects_small_buffer() {
        let mut buf = [0u8; 10];
        let err = TelegramBuilder::new(IndividualAddress::default(), ga!(1 / 0 / 1))
            .payload(&[0x00, 0x12, 0x34])
            .build_into(&mut buf)
            .unwrap_err();
        assert!(matches!(err, KnxError::Transport(e) if e.is_buffer_too_small()));
    }

    #[test]
    fn test_read_request_shape() {
        let mut buf = [0u8; 32];
        let len = TelegramBuilder::new(IndividualAddress::pack(1, 1, 0), ga!(1 / 2 / 3))
            .command(CommandType::Read)
            .payload(&[0x00])
            .build_into(&mut buf)
            .unwrap();
        let t = Telegram::parse(&buf[..len]).unwrap();
        assert!(t.command.is_read());
        assert_eq!(t.payload.as_slice(), &[0x00]);
    }

    #[test]
    fn test_decoders() {
        let mut cemi = vec![0x29, 0x00, 0xBC, 0xE0, 0x11, 0x01, 0x08, 0x01, 0x05, 0x00, 0x80];
        cemi.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let t = Telegram::parse(&routed(&cemi)).unwrap();
        assert_eq!(t.as_u8().unwrap(), 0xDE);
        assert_eq!(t.as_i8().unwrap(), 0xDEu8 as i8);
        assert_eq!(t.as_u16().unwrap(), 0xDEAD);
        assert_eq!(t.as_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(t.as_i32().unwrap(), 0xDEAD_BEEFu32 as i32);
        assert_eq!(t.as_color().unwrap(), Color { red: 0xDE, green: 0xAD, blue: 0xBE });
    }

    #[test]
    fn test_decoders_short_payload() {
        let t = Telegram::parse(&routed(&SWITCH_ON)).unwrap();
        assert!(t.as_u8().is_err());
        assert!(t.as_float2().is_err());
        assert!(t.as_time().is_err());
        assert_eq!(t.as_text().unwrap(), "");
    }

    #[test]
    fn test_text_stops_at_nul() {
        let mut cemi = vec![0x29, 0x00, 0xBC, 0xE0, 0x11, 0x01, 0x08, 0x01, 15, 0x00, 0x80];
        cemi.extend_from_slice(b"KNX is OK\0\0\0\0\0");
        let t = Telegram::parse(&routed(&cemi)).unwrap();
        assert_eq!(t.as_text().unwrap(), "KNX is OK");
    }
}
