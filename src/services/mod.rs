pub mod appointments;
pub mod availability;
pub mod booking;
pub mod context;
pub mod dispatcher;
pub mod injector;
pub mod scheduling;
pub mod template;
pub mod tenant;
