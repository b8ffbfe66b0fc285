use std::path::PathBuf;

use simdupe::duplicates::{BucketRule, FinderConfig, SimilarityFinder};
use simdupe::error::ExitCode;
use simdupe::output::{CsvOutput, JsonOutput};
use simdupe::scanner::{FileRecord, Fingerprint, MediaKind};

fn records() -> Vec<FileRecord> {
    let near = |path: &str, kind, value: u64| {
        FileRecord::new(PathBuf::from(path), kind, Fingerprint::from_u64(value))
    };
    vec![
        near("/img/a.jpg", MediaKind::Image, 0x00ff_00ff_00ff_00ff),
        near("/img/b.jpg", MediaKind::Image, 0x00ff_00ff_00ff_00fe),
        near("/img/c.jpg", MediaKind::Image, 0x00ff_00ff_00ff_00fc),
        near("/img/other.jpg", MediaKind::Image, 0xff00_ff00_ff00_ff00),
        near("/vid/a.mp4", MediaKind::Video, 0x1234),
        near("/vid/b.mp4", MediaKind::Video, 0x1234),
    ]
}

#[test]
fn test_json_report_shape() {
    let finder = SimilarityFinder::new(FinderConfig::default().with_threshold(0.95));
    let (groups, summary) = finder.find(records()).unwrap();
    let exit_code = ExitCode::for_outcome(summary.duplicate_groups, 0);
    let output = JsonOutput::new(&groups, &summary, exit_code);
    let json: serde_json::Value = serde_json::from_str(&output.to_json_pretty().unwrap()).unwrap();

    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(
        images[0]["files"],
        serde_json::json!(["/img/a.jpg", "/img/b.jpg", "/img/c.jpg"])
    );
    // a~c (62/64) is compared before b~c, so c records the weaker edge
    let members = images[0]["members"].as_array().unwrap();
    assert_eq!(members[0]["similarity"], 100.0);
    assert_eq!(members[1]["similarity"], 98.44);
    assert_eq!(members[2]["similarity"], 96.88);
    assert_eq!(images[0]["similarity"], 96.88);

    let videos = json["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["similarity"], 100.0);

    assert_eq!(json["summary"]["duplicate_groups"], 2);
    assert_eq!(json["summary"]["duplicate_files"], 5);
    assert_eq!(json["summary"]["exit_code_name"], "SD000");
    assert!(json["generated_at"].as_str().unwrap().contains('T'));
}

#[test]
fn test_json_report_prefix_rule() {
    let finder = SimilarityFinder::new(
        FinderConfig::default()
            .with_threshold(0.95)
            .with_bucket_rule(BucketRule::new(32, 1).unwrap()),
    );
    let (groups, summary) = finder.find(records()).unwrap();
    let output = JsonOutput::new(&groups, &summary, ExitCode::Success).with_kinds(false, true);
    let json: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

    assert!(json.get("images").is_none());
    assert_eq!(json["videos"].as_array().unwrap().len(), 1);
}

#[test]
fn test_csv_report_rows() {
    let finder = SimilarityFinder::new(FinderConfig::default().with_threshold(0.95));
    let (groups, _) = finder.find(records()).unwrap();
    let csv = CsvOutput::new(&groups).to_string().unwrap();

    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 5);
    assert_eq!(&rows[0][0], "image");
    assert_eq!(&rows[0][2], "/img/a.jpg");
    assert_eq!(&rows[0][4], "true");
    assert_eq!(&rows[3][0], "video");
    assert_eq!(&rows[3][1], "1");
    assert!(rows.iter().all(|r| &r[2] != "/img/other.jpg"));
}
