pub mod money;
pub mod time;

pub use money::Fare;
pub use time::{Day, Timestamp};
