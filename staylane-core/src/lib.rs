pub mod dates;
pub mod pii;
