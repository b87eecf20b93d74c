pub mod attendance;
pub mod profile;
pub mod role;
