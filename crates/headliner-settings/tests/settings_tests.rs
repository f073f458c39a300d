//! Settings object and loader behaviour, exercised through the public API.

use std::fs;

use headliner_settings::{merge, read_config_file, settings, ConfigError, Options, SettingsObj};
use serde_json::json;
use tempfile::TempDir;

fn create_config_file(dir: &TempDir, config: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.path().join("settings.json");
    fs::write(&path, serde_json::to_string(config).unwrap()).unwrap();
    path
}

// =============================================================================
// update
// =============================================================================

#[test]
fn test_unset_name_takes_incoming_value() {
    let values = [
        json!("text"),
        json!(7),
        json!(false),
        json!(null),
        json!([1, 2]),
        json!({"nested": {"deep": 1}}),
    ];

    for value in values {
        let mut obj = SettingsObj::new();
        obj.update([("name", value.clone())]);
        assert_eq!(obj["name"], value);
    }
}

#[test]
fn test_disjoint_mappings_keep_all_keys() {
    let mut obj = settings! { foo: {"a": 1, "b": {"c": 2}} };

    obj.update([("foo", json!({"d": [3], "e": null}))]);

    assert_eq!(obj["foo"], json!({"a": 1, "b": {"c": 2}, "d": [3], "e": null}));
}

#[test]
fn test_shared_mapping_key_is_merged_recursively() {
    let a = json!({"k": {"x": 1, "y": {"z": 1}}});
    let b = json!({"k": {"y": {"w": 2}}});
    let mut obj = SettingsObj::with_values([("foo", a.clone())]);

    obj.update([("foo", b.clone())]);

    assert_eq!(obj["foo"]["k"], merge(a["k"].clone(), b["k"].clone()));
    assert_eq!(obj["foo"]["k"]["x"], 1);
    assert_eq!(obj["foo"]["k"]["y"], json!({"z": 1, "w": 2}));
}

#[test]
fn test_non_mapping_replaces_existing_mapping() {
    for replacement in [json!(1), json!("s"), json!([1]), json!(null), json!(true)] {
        let mut obj = settings! { foo: {"a": 1, "b": 2} };
        obj.update([("foo", replacement.clone())]);
        assert_eq!(obj["foo"], replacement);
    }
}

#[test]
fn test_mapping_replaces_existing_non_mapping() {
    for existing in [json!(1), json!("s"), json!([1]), json!(null)] {
        let mut obj = SettingsObj::with_values([("foo", existing)]);
        obj.update([("foo", json!({"a": 1}))]);
        assert_eq!(obj["foo"], json!({"a": 1}));
    }
}

#[test]
fn test_update_twice_with_same_value_is_idempotent() {
    let x = json!({"bar": {"baz": "BAZ", "list": [1, 2]}});
    let mut once = settings! { foo: {"bar": {"keep": true}} };
    once.update([("foo", x.clone())]);

    let mut twice = once.clone();
    twice.update([("foo", x)]);

    assert_eq!(once, twice);
}

#[test]
fn test_update_order_of_names_does_not_matter() {
    let mut first = settings! { a: {"x": 1}, b: 2 };
    let mut second = first.clone();

    first.update([("a", json!({"y": 2})), ("b", json!({"z": 3}))]);
    second.update([("b", json!({"z": 3})), ("a", json!({"y": 2}))]);

    assert_eq!(first, second);
}

#[test]
fn test_merged_value_is_owned_by_container() {
    let mut source = json!({"bar": "baz"});
    let mut obj = SettingsObj::new();

    obj.update([("foo", source.clone())]);
    source["bar"] = json!("changed");

    assert_eq!(obj["foo"]["bar"], "baz");
}

#[test]
fn test_replaces_deep_element_scenario() {
    let mut obj = settings! { foo: {"bar": {"baz": "baz"}} };

    obj.update([("foo", json!({"bar": {"baz": "BAZ"}}))]);

    assert_eq!(obj["foo"]["bar"]["baz"], "BAZ");
}

#[test]
fn test_merges_deep_element_scenario() {
    let mut obj = settings! { foo: {"bar": {"baz1": "baz1"}} };

    obj.update([("foo", json!({"bar": {"baz2": "baz2"}}))]);

    assert_eq!(obj["foo"]["bar"]["baz1"], "baz1");
    assert_eq!(obj["foo"]["bar"]["baz2"], "baz2");
}

// =============================================================================
// read_config_file
// =============================================================================

#[test]
fn test_reads_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = create_config_file(&dir, &json!({"foo": {"bar": "baz"}}));

    let config = read_config_file(&Options::new(&path)).unwrap();

    assert_eq!(config["foo"]["bar"], "baz");
}

#[test]
fn test_loaded_settings_can_be_updated() {
    let dir = TempDir::new().unwrap();
    let path = create_config_file(
        &dir,
        &json!({"deploy": {"user": "headliner", "hosts": ["a"]}, "debug": false}),
    );

    let mut config = read_config_file(&Options::new(&path)).unwrap();
    config.update([("deploy", json!({"hosts": ["b", "c"]}))]);

    assert_eq!(config.get_str("deploy.user"), Some("headliner"));
    assert_eq!(config["deploy"]["hosts"], json!(["b", "c"]));
    assert_eq!(config.get_bool("debug"), Some(false));
}

#[test]
fn test_nonexistent_path_is_an_error() {
    let dir = TempDir::new().unwrap();

    let result = read_config_file(&Options::new(dir.path().join("nope.json")));

    match result {
        Err(ConfigError::FileAccess { source, .. }) => {
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected FileAccess error, got {:?}", other),
    }
}

#[test]
fn test_invalid_json_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "not json at all").unwrap();

    let result = read_config_file(&Options::new(&path));

    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn test_file_is_left_untouched() {
    let dir = TempDir::new().unwrap();
    let path = create_config_file(&dir, &json!({"foo": 1}));
    let before = fs::read(&path).unwrap();

    let mut config = read_config_file(&Options::new(&path)).unwrap();
    config.update([("foo", json!(2))]);

    assert_eq!(fs::read(&path).unwrap(), before);
}
