#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_core::{SocketConfig, SocketUrl};

fuzz_target!(|data: &str| {
    let strict = SocketConfig { allow_insecure: false };
    if let Ok(url) = SocketUrl::parse(data, &strict) {
        assert!(url.as_str().starts_with("wss://"));
    }

    if let Ok(url) = SocketUrl::parse(data, &SocketConfig::default()) {
        assert!(!url.as_str().contains([' ', '\t', '\r', '\n']));
    }
});
