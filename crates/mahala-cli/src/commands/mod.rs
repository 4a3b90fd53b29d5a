pub mod common;
pub mod config;
pub mod identity;
pub mod sync;
pub mod validator;
pub mod watch;
