mod cleanup;
mod seed;

pub use cleanup::cmd_cleanup;
pub use seed::cmd_seed;
