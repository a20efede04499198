//! View state for the student and admin screens. Each view owns its
//! state and talks to the API through an injected `ClinicClient`.
pub mod appointments;
pub mod availability;
pub mod block_times;

pub use appointments::{MyAppointmentsView, RescheduleDraft};
pub use availability::AvailabilityView;
pub use block_times::BlockTimeView;
