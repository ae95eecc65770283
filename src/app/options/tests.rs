use std::time::Duration;

use clap::Parser;
use tempfile::NamedTempFile;

use super::{
    CloudOptions, GridSeed, OptionsError, OptionsFile, Shape, WeightScale, load_options_file,
};
use crate::{cli::Cli, render::color::WordColor};

fn file(json: &str) -> OptionsFile {
    serde_json::from_str(json).expect("valid options json")
}

#[test]
fn defaults_are_valid() {
    let options = CloudOptions::default().validated().expect("defaults validate");
    assert_eq!(options.grid_size, 8);
    assert_eq!(options.seed, GridSeed::Clear);
    assert!((options.ellipticity - 0.65).abs() < f64::EPSILON);
    assert!(options.abort_threshold.is_none());
}

#[test]
fn grid_size_is_floored_and_clamped() {
    let options = CloudOptions::default()
        .merge_file(file(r#"{"gridSize": 9.7}"#))
        .expect("merge");
    assert_eq!(options.grid_size, 9);

    let options = CloudOptions::default()
        .merge_file(file(r#"{"gridSize": 1}"#))
        .expect("merge");
    assert_eq!(options.grid_size, 4);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = serde_json::from_str::<OptionsFile>(r#"{"gridSize": 8, "rotateRatio": 0.5}"#)
        .expect_err("unknown key");
    assert!(err.to_string().contains("rotateRatio"));
}

#[test]
fn clear_canvas_false_selects_preserve_mode() {
    let options = CloudOptions::default()
        .merge_file(file(r#"{"clearCanvas": false}"#))
        .expect("merge");
    assert_eq!(options.seed, GridSeed::Preserve);
}

#[test]
fn merge_maps_milliseconds_and_shape() {
    let options = CloudOptions::default()
        .merge_file(file(
            r#"{"wait": 15, "abortThreshold": 250, "shape": "square", "origin": [10, 20]}"#,
        ))
        .expect("merge");
    assert_eq!(options.wait, Duration::from_millis(15));
    assert_eq!(options.abort_threshold, Some(Duration::from_millis(250)));
    assert!(matches!(options.shape, Shape::Square));
    assert_eq!(options.origin, Some((10.0, 20.0)));
}

#[test]
fn zero_abort_threshold_disables_budget() {
    let options = CloudOptions::default()
        .merge_file(file(r#"{"abortThreshold": 0}"#))
        .expect("merge");
    assert!(options.abort_threshold.is_none());
}

#[test]
fn invalid_colors_are_reported_with_field() {
    let err = CloudOptions::default()
        .merge_file(file(r##"{"backgroundColor": "#zzz"}"##))
        .expect_err("bad color");
    assert!(matches!(
        err,
        OptionsError::Color {
            field: "backgroundColor",
            ..
        }
    ));
}

#[test]
fn ellipticity_must_be_positive() {
    let err = CloudOptions::default()
        .merge_file(file(r#"{"ellipticity": 0}"#))
        .expect_err("zero ellipticity");
    assert!(matches!(err, OptionsError::Ellipticity(_)));
}

#[test]
fn mask_gap_must_fit_inside_cell() {
    let err = CloudOptions::default()
        .merge_file(file(r#"{"maskGapWidth": 8}"#))
        .expect_err("gap too wide");
    assert!(matches!(err, OptionsError::MaskGap { .. }));
}

#[test]
fn cli_flags_override_file_values() {
    let cli = Cli::parse_from([
        "word-cloud",
        "w.json",
        "--grid-size",
        "12",
        "--color",
        "random-light",
        "--shrink-to-fit",
        "--preserve",
    ]);
    let options = CloudOptions::default()
        .merge_file(file(r##"{"gridSize": 6, "color": "#123456"}"##))
        .and_then(|o| o.apply_cli(&cli))
        .expect("merge");
    assert_eq!(options.grid_size, 12);
    assert!(matches!(options.color, WordColor::RandomLight));
    assert!(options.shrink_to_fit);
    assert_eq!(options.seed, GridSeed::Preserve);
}

#[test]
fn linear_weight_scale_multiplies() {
    let scale = WeightScale::Linear(2.5);
    assert!((scale.font_size(4.0) - 10.0).abs() < f32::EPSILON);
}

#[test]
fn options_file_loads_from_disk() {
    let file = NamedTempFile::new().expect("temp file");
    std::fs::write(file.path(), r#"{"weightFactor": 3, "drawMask": true}"#).expect("write");
    let loaded = load_options_file(file.path()).expect("load");
    assert_eq!(loaded.weight_factor, Some(3.0));
    assert_eq!(loaded.draw_mask, Some(true));
}

#[test]
fn options_file_reports_missing_path() {
    let err = load_options_file(std::path::Path::new("/definitely/not/here.json"))
        .expect_err("missing file");
    assert!(err.to_string().contains("reading options file"));
}
