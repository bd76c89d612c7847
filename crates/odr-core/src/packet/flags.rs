//! Route packet flag byte.
//!
//! Bit layout (LSB first): request, reply, forced rediscovery,
//! reply-already-sent. The upper four bits are reserved and ignored.

const REQ: u8 = 0x01;
const REP: u8 = 0x02;
const FORCED: u8 = 0x04;
const REPLY_SENT: u8 = 0x08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteFlags {
    pub request: bool,
    pub reply: bool,
    pub forced: bool,
    pub reply_sent: bool,
}

impl RouteFlags {
    /// Flags for a fresh route request.
    pub fn request(forced: bool) -> Self {
        Self {
            request: true,
            forced,
            ..Self::default()
        }
    }

    /// Flags for a route reply.
    pub fn reply(forced: bool) -> Self {
        Self {
            reply: true,
            forced,
            ..Self::default()
        }
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            request: byte & REQ != 0,
            reply: byte & REP != 0,
            forced: byte & FORCED != 0,
            reply_sent: byte & REPLY_SENT != 0,
        }
    }

    pub fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.request {
            byte |= REQ;
        }
        if self.reply {
            byte |= REP;
        }
        if self.forced {
            byte |= FORCED;
        }
        if self.reply_sent {
            byte |= REPLY_SENT;
        }
        byte
    }
}
