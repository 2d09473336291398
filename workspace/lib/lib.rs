#![allow(dead_code, non_snake_case, non_upper_case_globals)]

pub mod systems;

/// Set up logging for a binary: `info` by default, overridable through
/// `RUST_LOG`.
pub fn init_logging() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    )
    .format_timestamp(None)
    .init();
}
