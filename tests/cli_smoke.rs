use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_trafficmap")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "trafficmap.exe"
            } else {
                "trafficmap"
            });
            p
        })
}

fn batch_path() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("batch.json")
        .to_string_lossy()
        .to_string()
}

fn out_dir() -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn cli_frame_writes_png() {
    let out_path = out_dir().join("out.png");
    let _ = std::fs::remove_file(&out_path);
    let out_arg = out_path.to_string_lossy().to_string();

    let status = std::process::Command::new(exe())
        .args(["frame", "--in", batch_path().as_str(), "--tick", "30"])
        .args(["--width", "128", "--height", "72", "--out"])
        .arg(out_arg.as_str())
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out_path).unwrap();
    assert_eq!((img.width(), img.height()), (128, 72));
}

#[test]
fn cli_frames_dumps_json() {
    let out_path = out_dir().join("frames.json");
    let _ = std::fs::remove_file(&out_path);
    let cfg_path = out_dir().join("config.json");
    std::fs::write(&cfg_path, r#"{"animation_speed": 0.5}"#).unwrap();

    let status = std::process::Command::new(exe())
        .args(["frames", "--in", batch_path().as_str(), "--config"])
        .arg(&cfg_path)
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();
    assert!(status.success());

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    let frames = doc["frames"].as_array().unwrap();
    assert_eq!(frames.len(), 3);
    assert_eq!(doc["initial"]["progress"], 0.0);
    assert!(
        doc["initial"]["diagnostics"]
            .as_array()
            .unwrap()
            .iter()
            .any(|d| d["event_id"] == "b")
    );
}

#[test]
fn cli_stats_prints_counters() {
    let output = std::process::Command::new(exe())
        .args(["stats", "--in", batch_path().as_str()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["requests"], 3);
    assert_eq!(stats["connections"], 3);
    assert_eq!(stats["servers"], 6);
}
