pub mod convert;
pub mod time;
