//! Configuration layering: defaults < TOML file < SIMDUPE_* env < CLI flags.

use std::fs;

use simdupe::config::{BucketConfig, Config, ConfigError};
use simdupe::error::ExitCode;
use tempfile::tempdir;

use super::common::{arg, empty_config, lock_env, run, write_manifest};

#[test]
fn test_empty_file_gives_defaults() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = Config::load_from_path(&empty_config(dir.path())).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_missing_file_gives_defaults() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = Config::load_from_path(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_from_toml() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
threshold = 0.85
videos = false
threads = 3

[bucket]
key_bits = 32
bands = 1
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.threshold, 0.85);
    assert!(config.images);
    assert!(!config.videos);
    assert_eq!(config.threads, 3);
    assert_eq!(
        config.bucket,
        BucketConfig {
            key_bits: 32,
            bands: 1
        }
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_env_overrides_file() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "threshold = 0.85\n[bucket]\nbands = 2\n").unwrap();

    std::env::set_var("SIMDUPE_THRESHOLD", "0.75");
    std::env::set_var("SIMDUPE_BUCKET__BANDS", "8");
    std::env::set_var("SIMDUPE_IMAGES", "false");
    let config = Config::load_from_path(&path);
    std::env::remove_var("SIMDUPE_THRESHOLD");
    std::env::remove_var("SIMDUPE_BUCKET__BANDS");
    std::env::remove_var("SIMDUPE_IMAGES");

    let config = config.unwrap();
    assert_eq!(config.threshold, 0.75);
    assert_eq!(config.bucket.bands, 8);
    assert_eq!(config.bucket.key_bits, 16);
    assert!(!config.images);
}

#[test]
fn test_cli_overrides_env() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let manifest = write_manifest(
        dir.path(),
        "hashes.csv",
        &[
            "/p/a.jpg,image,8f373714acfcf4d0,",
            "/p/b.jpg,image,8f373714acfcf4d1,",
        ],
    );
    let output = dir.path().join("out.json");
    let argv = [
        "--config",
        arg(&config),
        "group",
        arg(&manifest),
        "-o",
        arg(&output),
    ];

    std::env::set_var("SIMDUPE_THRESHOLD", "0.999");
    let from_env = run(&argv);
    let mut with_flag = argv.to_vec();
    with_flag.extend(["-t", "0.9"]);
    let from_flag = run(&with_flag);
    std::env::remove_var("SIMDUPE_THRESHOLD");

    assert_eq!(from_env.unwrap(), ExitCode::NoDuplicates);
    assert_eq!(from_flag.unwrap(), ExitCode::Success);
}

#[test]
fn test_invalid_threshold_in_file() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "threshold = 1.5\n").unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Threshold(_))));

    let manifest = write_manifest(dir.path(), "hashes.csv", &[]);
    let err = run(&["--config", arg(&path), "group", arg(&manifest)]).unwrap_err();
    assert!(format!("{:#}", err).contains("1.5"));
}

#[test]
fn test_malformed_toml() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "threshold = \"very similar\"\n").unwrap();

    assert!(matches!(
        Config::load_from_path(&path),
        Err(ConfigError::Load(_))
    ));
}

#[test]
fn test_explicit_config_must_exist() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let err = run(&[
        "--config",
        arg(&dir.path().join("missing.toml")),
        "config",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn test_save_and_reload() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = Config {
        threshold: 0.8,
        threads: 2,
        bucket: BucketConfig {
            key_bits: 8,
            bands: 8,
        },
        ..Config::default()
    };

    config.save(&path).unwrap();
    assert_eq!(Config::load_from_path(&path).unwrap(), config);
}

#[test]
fn test_config_init_command() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("init.toml");

    assert_eq!(
        run(&["--config", arg(&path), "config", "--init"]).unwrap(),
        ExitCode::Success
    );
    assert_eq!(Config::load_from_path(&path).unwrap(), Config::default());

    // Refuses to overwrite
    assert!(run(&["--config", arg(&path), "config", "--init"]).is_err());

    // Prints the effective configuration
    assert_eq!(
        run(&["--config", arg(&path), "config"]).unwrap(),
        ExitCode::Success
    );
}
