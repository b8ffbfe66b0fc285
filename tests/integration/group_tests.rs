use std::fs;

use simdupe::error::{ExitCode, InterruptedError};
use tempfile::tempdir;

use super::common::{arg, empty_config, lock_env, read_json, run, write_manifest};

const A: &str = "8f373714acfcf4d0";
const A_ONE_BIT: &str = "8f373714acfcf4d1";
const FAR: &str = "70c8c8eb53030b2f";

#[test]
fn test_group_writes_json_report() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let manifest = write_manifest(
        dir.path(),
        "hashes.csv",
        &[
            &format!("/p/a.jpg,image,{A},"),
            &format!("/p/b.jpg,image,{A_ONE_BIT},"),
            &format!("/p/c.jpg,image,{FAR},"),
        ],
    );
    let output = dir.path().join("output.txt");

    let code = run(&[
        "--config",
        arg(&config),
        "group",
        arg(&manifest),
        "-o",
        arg(&output),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);

    let json = read_json(&output);
    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["group"], 1);
    assert_eq!(images[0]["files"], serde_json::json!(["/p/a.jpg", "/p/b.jpg"]));
    assert_eq!(images[0]["similarity"], 98.44);
    assert_eq!(json["videos"], serde_json::json!([]));
    assert_eq!(json["summary"]["total_records"], 3);
    assert_eq!(json["summary"]["exit_code"], 0);
}

#[test]
fn test_group_without_duplicates() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let manifest = write_manifest(
        dir.path(),
        "hashes.csv",
        &[&format!("/p/a.jpg,image,{A},"), &format!("/p/c.jpg,image,{FAR},")],
    );
    let output = dir.path().join("out.json");

    let code = run(&[
        "--config",
        arg(&config),
        "group",
        arg(&manifest),
        "-o",
        arg(&output),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
    assert_eq!(read_json(&output)["images"], serde_json::json!([]));
}

#[test]
fn test_group_with_failed_extraction_is_partial() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let manifest = write_manifest(
        dir.path(),
        "hashes.csv",
        &[
            &format!("/p/a.jpg,image,{A},"),
            &format!("/p/b.jpg,image,{A},"),
            "/p/broken.jpg,image,,cannot identify image file",
            "/p/garbled.jpg,image,xyz,",
        ],
    );
    let output = dir.path().join("out.json");

    let code = run(&[
        "--config",
        arg(&config),
        "group",
        arg(&manifest),
        "-o",
        arg(&output),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);

    let json = read_json(&output);
    assert_eq!(json["summary"]["failed_files"], 2);
    assert_eq!(json["images"][0]["files"].as_array().unwrap().len(), 2);
    let report = fs::read_to_string(&output).unwrap();
    assert!(!report.contains("\"/p/broken.jpg\""));
}

#[test]
fn test_group_no_videos_omits_key() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let manifest = write_manifest(
        dir.path(),
        "hashes.csv",
        &[
            &format!("/p/a.jpg,,{A},"),
            &format!("/p/b.jpg,,{A},"),
            &format!("/v/a.mp4,,{A},"),
            &format!("/v/b.mp4,,{A},"),
        ],
    );
    let output = dir.path().join("out.json");

    let code = run(&[
        "--config",
        arg(&config),
        "group",
        arg(&manifest),
        "-o",
        arg(&output),
        "--no-videos",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);

    let json = read_json(&output);
    assert!(json.get("videos").is_none());
    assert_eq!(json["images"].as_array().unwrap().len(), 1);
    assert_eq!(json["summary"]["disabled_files"], 2);
}

#[test]
fn test_group_csv_format() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let manifest = write_manifest(
        dir.path(),
        "hashes.csv",
        &[&format!("/v/a.mp4,video,{A},"), &format!("/v/b.mp4,video,{A},")],
    );
    let output = dir.path().join("out.csv");

    run(&[
        "--config",
        arg(&config),
        "group",
        arg(&manifest),
        "-o",
        arg(&output),
        "--format",
        "csv",
    ])
    .unwrap();

    let csv = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "kind,group,file,similarity,founder");
    assert_eq!(lines[1], "video,1,/v/a.mp4,1.0,true");
    assert_eq!(lines[2], "video,1,/v/b.mp4,1.0,false");
}

#[test]
fn test_group_merges_manifests() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let first = write_manifest(dir.path(), "one.csv", &[&format!("/p/a.jpg,image,{A},")]);
    let second = write_manifest(dir.path(), "two.csv", &[&format!("/q/a.jpg,image,{A},")]);
    let output = dir.path().join("out.json");

    let code = run(&[
        "--config",
        arg(&config),
        "group",
        arg(&first),
        arg(&second),
        "-o",
        arg(&output),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        read_json(&output)["images"][0]["files"],
        serde_json::json!(["/p/a.jpg", "/q/a.jpg"])
    );
}

#[test]
fn test_group_threshold_flag() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = dir.path().join("strict.toml");
    fs::write(&config, "threshold = 0.99\n").unwrap();
    let manifest = write_manifest(
        dir.path(),
        "hashes.csv",
        &[&format!("/p/a.jpg,image,{A},"), &format!("/p/b.jpg,image,{A_ONE_BIT},")],
    );
    let output = dir.path().join("out.json");

    let strict = run(&[
        "--config",
        arg(&config),
        "group",
        arg(&manifest),
        "-o",
        arg(&output),
    ])
    .unwrap();
    assert_eq!(strict, ExitCode::NoDuplicates);

    let relaxed = run(&[
        "--config",
        arg(&config),
        "group",
        arg(&manifest),
        "-o",
        arg(&output),
        "-t",
        "0.9",
    ])
    .unwrap();
    assert_eq!(relaxed, ExitCode::Success);
}

#[test]
fn test_group_prefix_rule_flags() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    // Differ in the very first bit only
    let manifest = write_manifest(
        dir.path(),
        "hashes.csv",
        &[
            "/p/a.jpg,image,8f373714acfcf4d0,",
            "/p/b.jpg,image,0f373714acfcf4d0,",
        ],
    );
    let output = dir.path().join("out.json");

    let code = run(&[
        "--config",
        arg(&config),
        "group",
        arg(&manifest),
        "-o",
        arg(&output),
        "--key-bits",
        "32",
        "--bands",
        "1",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_group_missing_manifest() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let missing = dir.path().join("nope.csv");

    let err = run(&[
        "--config",
        arg(&config),
        "group",
        arg(&missing),
        "-o",
        arg(&dir.path().join("out.json")),
    ])
    .unwrap_err();
    assert!(format!("{:#}", err).contains("nope.csv"));
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(err.downcast_ref::<InterruptedError>().is_none());
}

#[test]
fn test_group_rejects_invalid_bucket_flags() {
    let _lock = lock_env();
    let dir = tempdir().unwrap();
    let config = empty_config(dir.path());
    let manifest = write_manifest(dir.path(), "hashes.csv", &[&format!("/p/a.jpg,image,{A},")]);

    let err = run(&[
        "--config",
        arg(&config),
        "group",
        arg(&manifest),
        "-o",
        arg(&dir.path().join("out.json")),
        "--key-bits",
        "65",
    ])
    .unwrap_err();
    assert!(format!("{:#}", err).contains("65"));
}

#[test]
fn test_compare_command() {
    let _lock = lock_env();
    assert_eq!(run(&["compare", A, A_ONE_BIT]).unwrap(), ExitCode::Success);
    assert!(run(&["compare", A, "8f37"]).is_err());
    assert!(run(&["compare", A, "not-hex"]).is_err());
}
