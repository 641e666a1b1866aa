pub mod common;
pub mod domain;
pub mod filter;
pub mod infra;
pub mod session;
pub mod util;
