pub mod attendance;
pub mod designation;
pub mod organization;
pub mod project;
pub mod sheet;
pub mod worker;
