//! Command implementations.

pub mod ask;
pub mod extract;
pub mod profile;

pub use self::ask::execute_ask;
pub use self::extract::execute_extract;
pub use self::profile::execute_profile;
