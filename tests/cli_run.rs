use std::fs;

use clap::Parser;
use image::Rgba;
use tempfile::TempDir;
use word_cloud::{
    app::{events::ChannelObserver, host::WordCloud},
    build_targets,
    cli::Cli,
    render::font::BitmapFont,
    resolve_options,
};

fn write_words(dir: &TempDir) -> String {
    let path = dir.path().join("words.json");
    fs::write(
        &path,
        r#"[["rust", 24], {"word": "cargo", "weight": 14, "attributes": {"href": "/cargo"}}, ["crate", 10]]"#,
    )
    .expect("write words");
    path.display().to_string()
}

#[tokio::test]
async fn writes_png_and_elements() {
    let dir = TempDir::new().expect("temp dir");
    let words = write_words(&dir);
    let png = dir.path().join("cloud.png");
    let elements = dir.path().join("cloud.json");
    let cli = Cli::parse_from([
        "word-cloud",
        words.as_str(),
        "--width",
        "320",
        "--height",
        "200",
        "--color",
        "#224466",
        "--out",
        png.to_str().expect("utf8 path"),
        "--elements",
        elements.to_str().expect("utf8 path"),
    ]);

    word_cloud::run(cli).await.expect("run");

    let image = image::open(&png).expect("png written").to_rgba8();
    assert_eq!(image.dimensions(), (320, 200));
    assert!(image.pixels().any(|p| p.0 == [0x22, 0x44, 0x66, 255]));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&elements).expect("elements written"))
            .expect("valid json");
    let placed = json["elements"].as_array().expect("elements array");
    assert_eq!(placed.len(), 3);
    assert_eq!(placed[0]["text"], "rust");
    assert_eq!(placed[1]["attributes"]["href"], "/cargo");
    let style = placed[0]["style"].as_str().expect("inline style");
    assert!(style.starts_with("font: normal 24px ") && style.contains("color: #224466;"));
    assert_eq!(json["position"], "relative");
}

#[test]
fn config_file_is_merged_under_flags() {
    let dir = TempDir::new().expect("temp dir");
    let words = write_words(&dir);
    let config = dir.path().join("options.json");
    fs::write(&config, r#"{"gridSize": 6, "ellipticity": 1.0, "wait": 5}"#).expect("write config");
    let cli = Cli::parse_from([
        "word-cloud",
        words.as_str(),
        "--config",
        config.to_str().expect("utf8 path"),
        "--grid-size",
        "10",
    ]);
    let options = resolve_options(&cli).expect("options");
    assert_eq!(options.grid_size, 10);
    assert!((options.ellipticity - 1.0).abs() < f64::EPSILON);
    assert_eq!(options.wait.as_millis(), 5);
}

#[test]
fn bad_config_key_is_reported() {
    let dir = TempDir::new().expect("temp dir");
    let words = write_words(&dir);
    let config = dir.path().join("options.json");
    fs::write(&config, r#"{"rotateRatio": 0.3}"#).expect("write config");
    let cli = Cli::parse_from([
        "word-cloud",
        words.as_str(),
        "--config",
        config.to_str().expect("utf8 path"),
    ]);
    let err = resolve_options(&cli).expect_err("unknown key");
    assert!(format!("{err:#}").contains("rotateRatio"));
}

#[test]
fn mask_text_reserves_the_middle_of_the_canvas() {
    let cli = Cli::parse_from([
        "word-cloud",
        "unused.json",
        "--width",
        "200",
        "--height",
        "100",
        "--mask-text",
        "HI",
        "--mask-font-size",
        "40",
    ]);
    let options = resolve_options(&cli).expect("options");
    let targets = build_targets(&cli, &options).expect("targets");
    let canvas = targets.canvas.expect("canvas");
    assert_eq!(canvas.pixel(0, 0), Rgba([255, 255, 255, 255]));
    assert!(
        (60..140)
            .flat_map(|x| (30..70).map(move |y| (x, y)))
            .any(|(x, y)| canvas.pixel(x, y)[3] == 254)
    );
    assert!(targets.container.is_some());
}

#[tokio::test]
async fn mask_text_is_repainted_after_a_resize() {
    let cli = Cli::parse_from([
        "word-cloud",
        "unused.json",
        "--width",
        "200",
        "--height",
        "100",
        "--mask-text",
        "HI",
        "--mask-font-size",
        "40",
    ]);
    let options = resolve_options(&cli).expect("options");
    let targets = build_targets(&cli, &options).expect("targets");
    let (observer, _rx) = ChannelObserver::new();
    let cloud = WordCloud::spawn(targets, options, Box::new(BitmapFont), Box::new(observer))
        .expect("spawn");

    cloud.resize(300, 150).expect("resize");
    let snapshot = cloud.snapshot().await.expect("snapshot");
    let canvas = snapshot.targets.canvas.expect("canvas");
    assert_eq!((canvas.width(), canvas.height()), (300, 150));
    assert_eq!(canvas.pixel(0, 0), Rgba([255, 255, 255, 255]));
    assert!(canvas.image().pixels().any(|p| p[3] == 254));
}

#[test]
fn elements_only_output_has_no_canvas() {
    let cli = Cli::parse_from(["word-cloud", "w.json", "--output", "elements"]);
    let options = resolve_options(&cli).expect("options");
    let targets = build_targets(&cli, &options).expect("targets");
    assert!(targets.canvas.is_none());
    assert_eq!(targets.container.map(|c| (c.width, c.height)), Some((800, 600)));
}
