pub mod capture;
pub mod cloak;
pub mod control;
pub mod driver;
pub mod error;
pub mod output;
