use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*; // Used for writing assertions
use std::fs;
use std::path::PathBuf;
use std::process::Command; // Run programs
use tempfile::{tempdir, TempDir};

const COAST: &str = r#"[
    { "module_name": "water", "sprite_name": "water.png", "neighbors": ["water", "sand"] },
    { "module_name": "sand", "sprite_name": "sand.png", "neighbors": ["water", "sand", "grass"] },
    { "module_name": "grass", "sprite_name": "grass.png", "neighbors": ["sand", "grass"] }
]"#;

fn write_catalog(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).expect("Failed to write catalog");
    file_path
}

fn tile_collapse() -> Command {
    let mut cmd = Command::cargo_bin("tile-collapse").expect("binary should be built");
    cmd.env("RUST_LOG", "info");
    cmd
}

#[test]
fn test_basic_run_writes_grid_and_history() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let catalog = write_catalog(&tmp_dir, "coast.json", COAST);
    let output_file = tmp_dir.path().join("grid.txt");
    let history_file = tmp_dir.path().join("history.csv");

    tile_collapse()
        .arg("--catalog")
        .arg(&catalog)
        .args(["--grid-size", "5", "--seed", "7"])
        .arg("--output-path")
        .arg(&output_file)
        .arg("--history-csv")
        .arg(&history_file)
        .assert()
        .success()
        .stderr(predicate::str::contains("WFC completed successfully"));

    let grid = fs::read_to_string(&output_file)?;
    let rows: Vec<Vec<&str>> = grid.lines().map(|l| l.split(' ').collect()).collect();
    assert_eq!(rows.len(), 5);
    for row in &rows {
        assert_eq!(row.len(), 5);
        assert!(row.iter().all(|name| ["water", "sand", "grass"].contains(name)));
    }
    // Water and grass never touch.
    for r in 0..5 {
        for c in 0..5 {
            let here = rows[r][c];
            let right = (c + 1 < 5).then(|| rows[r][c + 1]);
            let down = (r + 1 < 5).then(|| rows[r + 1][c]);
            for other in [right, down].into_iter().flatten() {
                assert!(
                    !matches!((here, other), ("water", "grass") | ("grass", "water")),
                    "water next to grass at ({r}, {c})"
                );
            }
        }
    }

    let history = fs::read_to_string(&history_file)?;
    assert!(history.starts_with("step,row,col,module_index,module_name\n"));
    assert!(history.lines().count() >= 2);

    Ok(())
}

#[test]
fn test_same_seed_same_grid() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let catalog = write_catalog(&tmp_dir, "coast.json", COAST);
    let mut outputs = Vec::new();

    for name in ["first.txt", "second.txt"] {
        let output_file = tmp_dir.path().join(name);
        tile_collapse()
            .arg("--catalog")
            .arg(&catalog)
            .args(["--grid-size", "8", "--seed", "1234"])
            .arg("--output-path")
            .arg(&output_file)
            .assert()
            .success();
        outputs.push(fs::read_to_string(&output_file)?);
    }

    assert_eq!(outputs[0], outputs[1]);
    Ok(())
}

#[test]
fn test_unknown_neighbor_exits_84() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let catalog = write_catalog(
        &tmp_dir,
        "broken.json",
        r#"[
            { "module_name": "A", "sprite_name": "a.png", "neighbors": ["B"] },
            { "module_name": "B", "sprite_name": "b.png", "neighbors": ["Z"] }
        ]"#,
    );
    let output_file = tmp_dir.path().join("grid.txt");

    tile_collapse()
        .arg("--catalog")
        .arg(&catalog)
        .arg("--output-path")
        .arg(&output_file)
        .assert()
        .code(84)
        .stderr(predicate::str::contains("Z"));

    assert!(!output_file.exists(), "no grid may be written");
    Ok(())
}

#[test]
fn test_missing_catalog_exits_84() {
    let tmp_dir = tempdir().expect("tempdir");
    tile_collapse()
        .arg("--catalog")
        .arg(tmp_dir.path().join("nowhere.json"))
        .assert()
        .code(84);
}

#[test]
fn test_contradictions_exit_3() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    // Each module only tolerates itself. With a depth limit of 1 on a 2x2
    // grid the last cell may pick the other module and clash.
    let catalog = write_catalog(
        &tmp_dir,
        "islands.json",
        r#"[
            { "module_name": "A", "sprite_name": "a.png", "neighbors": [] },
            { "module_name": "B", "sprite_name": "b.png", "neighbors": [] }
        ]"#,
    );

    let mut contradictions = 0;
    for seed in 0..20 {
        let output = tile_collapse()
            .arg("--catalog")
            .arg(&catalog)
            .args(["--grid-size", "2", "--depth-limit", "1"])
            .args(["--seed", &seed.to_string()])
            .output()?;
        match output.status.code() {
            Some(0) => {}
            Some(3) => {
                contradictions += 1;
                assert!(String::from_utf8_lossy(&output.stderr).contains("Contradiction"));
            }
            other => panic!("seed {seed}: unexpected exit status {other:?}"),
        }
    }
    assert!(contradictions > 0, "expected at least one contradiction");
    Ok(())
}

#[test]
fn test_depth_limited_output_respects_shipped_rules() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let catalog = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("modules.json");
    let records: serde_json::Value = serde_json::from_str(&fs::read_to_string(&catalog)?)?;
    let declares = |from: &str, to: &str| {
        from == to
            || records.as_array().into_iter().flatten().any(|m| {
                m["module_name"] == from
                    && m["neighbors"].as_array().into_iter().flatten().any(|n| n == to)
            })
    };

    for seed in 0..40 {
        let output_file = tmp_dir.path().join(format!("grid-{seed}.txt"));
        let output = tile_collapse()
            .arg("--catalog")
            .arg(&catalog)
            .args(["--grid-size", "10", "--depth-limit", "1"])
            .args(["--seed", &seed.to_string()])
            .arg("--output-path")
            .arg(&output_file)
            .output()?;
        match output.status.code() {
            Some(0) => {
                let grid = fs::read_to_string(&output_file)?;
                let rows: Vec<Vec<&str>> =
                    grid.lines().map(|l| l.split(' ').collect()).collect();
                for r in 0..10 {
                    for c in 0..10 {
                        let here = rows[r][c];
                        let right = (c + 1 < 10).then(|| rows[r][c + 1]);
                        let down = (r + 1 < 10).then(|| rows[r + 1][c]);
                        for other in [right, down].into_iter().flatten() {
                            assert!(
                                declares(here, other) || declares(other, here),
                                "seed {seed}: {here} next to {other} at ({r}, {c})"
                            );
                        }
                    }
                }
            }
            Some(3) => assert!(!output_file.exists(), "seed {seed}: grid written anyway"),
            other => panic!("seed {seed}: unexpected exit status {other:?}"),
        }
    }
    Ok(())
}

#[test]
fn test_invalid_settings_exit_2() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let catalog = write_catalog(&tmp_dir, "coast.json", COAST);

    tile_collapse()
        .arg("--catalog")
        .arg(&catalog)
        .args(["--grid-size", "0"])
        .assert()
        .code(2);

    tile_collapse()
        .args(["--visualization-mode", "window"])
        .assert()
        .code(2);

    Ok(())
}

#[test]
fn test_config_file_and_env_layers() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let catalog = write_catalog(&tmp_dir, "coast.ron", r#"(
        modules: [
            (module_name: "water", sprite_name: "water.png", neighbors: ["water", "sand"]),
            (module_name: "sand", sprite_name: "sand.png", neighbors: ["water", "sand", "grass"]),
            (module_name: "grass", sprite_name: "grass.png", neighbors: ["sand", "grass"]),
        ],
    )"#);
    let config_file = tmp_dir.path().join("settings.toml");
    fs::write(
        &config_file,
        format!(
            "catalog = {:?}\ngrid_size = 3\nseed = 5\nsymmetry = \"strict\"\n",
            catalog.display().to_string()
        ),
    )?;
    let output_file = tmp_dir.path().join("grid.txt");

    tile_collapse()
        .arg("--config")
        .arg(&config_file)
        .env("TILE_COLLAPSE_GRID_SIZE", "4")
        .arg("--output-path")
        .arg(&output_file)
        .assert()
        .success();

    // The environment wins over the file.
    let grid = fs::read_to_string(&output_file)?;
    assert_eq!(grid.lines().count(), 4);
    Ok(())
}

#[test]
fn test_terminal_visualization_prints_frames() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let catalog = write_catalog(&tmp_dir, "coast.json", COAST);

    tile_collapse()
        .arg("--catalog")
        .arg(&catalog)
        .args(["--grid-size", "3", "--seed", "2", "--visualization-mode", "terminal"])
        .args(["--frame-interval", "1ms", "--report-progress-interval", "0s"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--- Frame 1"))
        .stderr(predicate::str::contains("Progress: Iter: 1"));

    Ok(())
}
