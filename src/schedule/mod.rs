pub mod controller;
pub mod registry;

pub use controller::{JobScheduleController, ScheduleController, ScheduleState, ScheduleStatus};
pub use registry::JobRegistry;
