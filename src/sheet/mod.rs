//! Attendance and payroll derivation for one sheet.
//!
//! Everything here is synchronous and pure: the handlers load data from the
//! backend, hand it to these types, and return whatever they derive.

pub mod attendance;
pub mod date_range;
pub mod payment;
