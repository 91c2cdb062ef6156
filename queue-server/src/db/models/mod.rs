//! Database Models

// Serde helpers
pub mod serde_helpers;

// Catalog (read-mostly)
pub mod service;
pub mod settings;

// Ticketing
pub mod notification;
pub mod ticket;

// Re-exports
pub use notification::{Notification, NotificationKind};
pub use service::{Service, ServiceCreate};
pub use settings::{AppointmentSettings, AppointmentSettingsPatch};
pub use ticket::{Ticket, TicketStatus};
