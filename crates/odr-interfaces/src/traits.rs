//! Frame transport trait and received-frame type.

use odr_core::types::{HwAddr, IfIndex};

use crate::error::InterfaceError;

/// A raw frame read from the link, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    /// Complete frame bytes, link header included.
    pub data: Vec<u8>,
    /// Hardware address of the neighbour that transmitted the frame.
    pub sender: HwAddr,
    /// Interface the frame arrived on.
    pub if_index: IfIndex,
}

/// Async trait implemented by everything that can carry ODR frames.
///
/// The routing engine produces fully serialized frames; implementations only
/// move bytes. Both methods take `&self` so a single transport can be shared
/// between a receive task and the sender.
pub trait FrameTransport: Send + Sync {
    /// Transmit `frame` out of `if_index`, addressed to `dest`.
    ///
    /// Returns the number of bytes written.
    fn send_frame(
        &self,
        if_index: IfIndex,
        dest: HwAddr,
        frame: &[u8],
    ) -> impl Future<Output = Result<usize, InterfaceError>> + Send;

    /// Receive the next frame addressed to this host.
    fn recv_frame(&self) -> impl Future<Output = Result<ReceivedFrame, InterfaceError>> + Send;
}
