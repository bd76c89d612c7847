//! Frame and packet codecs.

pub mod app;
pub mod flags;
pub mod frame;
pub mod route;

pub use app::AppPacket;
pub use flags::RouteFlags;
pub use frame::Frame;
pub use route::RoutePacket;
