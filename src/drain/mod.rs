//! Heroku log-drain line model and value decoding

pub mod record;
pub mod value;
