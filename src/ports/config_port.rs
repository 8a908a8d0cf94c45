//! Configuration access port trait.
//!
//! An absent key yields the caller's default. A present key that does not
//! parse as the requested type is a `ConfigInvalid` error naming it.

use crate::domain::error::AlgoTraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, AlgoTraderError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, AlgoTraderError>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, AlgoTraderError>;
}
