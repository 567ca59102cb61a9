use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn empty_environment_uses_defaults() {
    let config = ClientConfig::from_lookup(lookup(&[]));
    assert_eq!(config, ClientConfig::default());
    assert_eq!(config.ws_url, "ws://localhost:8080");
    assert_eq!(config.request_timeout, Duration::from_secs(10));
}

#[test]
fn values_override_defaults() {
    let config = ClientConfig::from_lookup(lookup(&[
        ("SVGPAD_WS_URL", "ws://docs.internal:9000"),
        ("SVGPAD_REQUEST_TIMEOUT_MS", "250"),
        ("SVGPAD_SESSION_FILE", "/tmp/session.json"),
    ]));
    assert_eq!(config.ws_url, "ws://docs.internal:9000");
    assert_eq!(config.request_timeout, Duration::from_millis(250));
    assert_eq!(config.session_file, PathBuf::from("/tmp/session.json"));
}

#[test]
fn bad_timeout_falls_back() {
    for raw in ["soon", "0", "-5", "  "] {
        let config = ClientConfig::from_lookup(lookup(&[("SVGPAD_REQUEST_TIMEOUT_MS", raw)]));
        assert_eq!(config.request_timeout, Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS), "raw={raw:?}");
    }
}

#[test]
fn blank_url_falls_back() {
    let config = ClientConfig::from_lookup(lookup(&[("SVGPAD_WS_URL", "   ")]));
    assert_eq!(config.ws_url, DEFAULT_WS_URL);
}
