//! Push notification handling: payload decode, display, interaction routing.

mod dispatcher;
mod payload;

pub use dispatcher::NotificationDispatcher;
pub use payload::{decode, NotificationPayload};
