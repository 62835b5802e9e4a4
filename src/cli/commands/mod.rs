pub mod ping;
pub mod serve;
pub mod token;
