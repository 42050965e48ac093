//! Client side of the xdg-desktop-portal `FileChooser.SaveFile` protocol.
//!
//! A `SaveFile` call only returns a request handle. The user's decision
//! arrives later as a `Request.Response` signal on that handle, which
//! [`portal::response::await_response`] correlates and decodes.

pub mod bus;
mod error;
pub mod files;
pub mod flow;
pub mod job;
pub mod portal;
pub mod variant;

pub use bus::{Bus, SessionBus, SignalEvent};
pub use error::Error;
pub use flow::{Outcome, save_copy};
pub use job::CopyJob;
pub use portal::{DialogSettings, Portal, PortalHandle};
