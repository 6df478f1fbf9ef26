use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::{Duration, SystemTime};
use steadfast_fs::{
    CommitStrategy, ConfigStore, Encoding, Error, File, NormalizedPath, Settings,
};
use tempfile::TempDir;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
struct TestConfig {
    name: String,
    count: i32,
}

#[test]
fn test_load_toml() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("config.toml");
    fs::write(&file_path, "name = \"test\"\ncount = 42").unwrap();

    let config: TestConfig = ConfigStore::new().load(&NormalizedPath::new(&file_path)).unwrap();

    assert_eq!(config, TestConfig { name: "test".into(), count: 42 });
}

#[test]
fn test_load_json() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("config.json");
    fs::write(&file_path, r#"{"name": "test", "count": 42}"#).unwrap();

    let config: TestConfig = ConfigStore::new().load(&NormalizedPath::new(&file_path)).unwrap();

    assert_eq!(config.count, 42);
}

#[test]
fn test_load_yaml() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("config.yml");
    fs::write(&file_path, "name: test\ncount: 42").unwrap();

    let config: TestConfig = ConfigStore::new().load(&NormalizedPath::new(&file_path)).unwrap();

    assert_eq!(config.name, "test");
}

#[test]
fn test_save_and_reload_each_format() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::new();
    let value = TestConfig { name: "saved".into(), count: 7 };

    for name in ["c.toml", "c.json", "c.yaml"] {
        let path = NormalizedPath::new(temp.path().join(name));
        store.save(&path, &value).unwrap();
        let loaded: TestConfig = store.load(&path).unwrap();
        assert_eq!(loaded, value, "format of {name}");
    }
}

#[test]
fn test_unsupported_format() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("config.ini"));

    let result = ConfigStore::new().save(&path, &TestConfig::default());
    assert!(matches!(result, Err(Error::UnsupportedFormat { .. })));
    assert!(!path.exists());
}

#[test]
fn test_parse_error_names_format() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("broken.json");
    fs::write(&file_path, "{ not json").unwrap();

    let result: Result<TestConfig, _> = ConfigStore::new().load(&NormalizedPath::new(&file_path));
    match result {
        Err(Error::ConfigParse { format, .. }) => assert_eq!(format, "JSON"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_load_or_default_for_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("absent.toml"));

    let config: TestConfig = ConfigStore::new().load_or_default(&path).unwrap();
    assert_eq!(config, TestConfig::default());
}

#[test]
fn test_save_file_refuses_external_edit() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("tracked.toml");
    fs::write(&file_path, "name = \"a\"\ncount = 1\n").unwrap();

    let store = ConfigStore::new();
    let mut file = File::with_conflict_check(&file_path);
    let mut config: TestConfig = store.load_file(&mut file).unwrap();

    fs::write(&file_path, "name = \"b\"\ncount = 2\n").unwrap();
    fs::File::options()
        .write(true)
        .open(&file_path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();

    config.count += 1;
    assert!(store.save_file(&mut file, &config).unwrap_err().is_conflict());
}

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();
    assert!(!settings.check_overwrite);
    assert_eq!(settings.encoding, Encoding::Utf8);
    assert_eq!(settings.writer.strategy, CommitStrategy::detect());
    assert!(settings.writer.sync_parent_dir);
}

#[test]
fn test_settings_load_partial_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("steadfast.toml");
    fs::write(
        &file_path,
        "check-overwrite = true\nencoding = \"utf-16le\"\n\n[writer]\nstrategy = \"backup-and-swap\"\n",
    )
    .unwrap();

    let settings = Settings::load(&NormalizedPath::new(&file_path)).unwrap();

    assert!(settings.check_overwrite);
    assert_eq!(settings.encoding, Encoding::Utf16Le);
    assert_eq!(settings.writer.strategy, CommitStrategy::BackupAndSwap);
    assert!(settings.writer.sync_parent_dir);
}

#[test]
fn test_settings_open_applies_encoding_and_checking() {
    let temp = TempDir::new().unwrap();
    let settings = Settings {
        check_overwrite: true,
        encoding: Encoding::Utf16Be,
        ..Settings::default()
    };

    let mut file = settings.open(temp.path().join("wide.txt"));
    assert!(file.check_overwrite());
    file.write("hi").unwrap();

    assert_eq!(fs::read(file.path().to_native()).unwrap(), vec![0, b'h', 0, b'i']);
    assert_eq!(file.read_text().unwrap(), "hi");
}
