pub mod appointment;
pub mod business;
pub mod customer;
pub mod webhook;

pub use appointment::{Appointment, AppointmentOverview, AppointmentStatus, BookingRecord, NewBooking};
pub use business::{Business, BusinessContext, BusinessHours, NewBusiness, Service, Staff};
pub use customer::Customer;
pub use webhook::{CallInfo, FunctionCallPayload, ToolCall, WebhookEnvelope, WebhookMessage};
