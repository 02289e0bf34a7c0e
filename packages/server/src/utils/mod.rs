pub mod demo_day;
pub mod fundraising;
pub mod hash;
pub mod jwt;
pub mod ordering;
pub mod social;
pub mod uploads;
