//! Logging setup
//!
//! The library only uses the `log` macros. Binaries and tests pick a backend;
//! this module wires up `env_logger` with the defaults the `waynorm` binary
//! uses. `RUST_LOG` always wins over the default filter.

use env_logger::{Builder, Env};

/// Default filter when `RUST_LOG` is not set.
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Install the global logger. Panics if a logger is already installed.
pub fn init(debug: bool) {
    Builder::from_env(Env::default().default_filter_or(default_filter(debug))).init();
}

/// Install the global logger unless one is already installed, e.g. from tests.
pub fn try_init(debug: bool) -> bool {
    Builder::from_env(Env::default().default_filter_or(default_filter(debug)))
        .is_test(cfg!(test))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(true), "debug");
        assert_eq!(default_filter(false), "info");
    }

    #[test]
    fn test_try_init_twice() {
        let _ = try_init(false);
        assert!(!try_init(false));
    }
}
