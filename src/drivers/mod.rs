//! Compile-time driver registry, replacing a `dlopen`'d shared-object
//! plugin with a static name → factory table.

use crate::driver::DriverFactory;

pub mod demo;

/// Resolve a driver name to its factory function. Add an entry here for
/// every statically-linked backend driver.
pub fn lookup(name: &str) -> Option<DriverFactory> {
    match name {
        "demo" => Some(demo::factory as DriverFactory),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_driver_is_registered() {
        assert!(lookup("demo").is_some());
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(lookup("vnc").is_none());
    }
}
