mod compile_config;

pub use compile_config::*;
