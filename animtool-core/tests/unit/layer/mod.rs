use std::io::Cursor;

use super::*;
use crate::source::{GifLoopMode, InMemorySink, decode_bytes};

fn temp_path(name: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("animtool_layer_{name}_{}.{ext}", std::process::id()))
}

/// Two opaque 4x4 frames (red, blue), 100 ms each, played three times.
fn write_source(path: &Path) {
    let palette = [255u8, 0, 0, 0, 0, 255];
    let mut bytes = Vec::new();
    {
        let mut enc = gif::Encoder::new(&mut bytes, 4, 4, &palette).unwrap();
        enc.set_repeat(gif::Repeat::Finite(2)).unwrap();
        for index in [0u8, 1] {
            let mut frame = gif::Frame {
                width: 4,
                height: 4,
                delay: 10,
                ..gif::Frame::default()
            };
            frame.buffer = std::borrow::Cow::Owned(vec![index; 16]);
            enc.write_frame(&frame).unwrap();
        }
    }
    std::fs::write(path, bytes).unwrap();
}

fn write_layer(path: &Path, width: u32, height: u32) {
    let layer = Picture::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    layer
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn run(
    name: &str,
    layer_size: (u32, u32),
    configure: impl FnOnce(&mut LayerOptions),
) -> InMemorySink {
    let input = temp_path(name, "gif");
    let layer = temp_path(name, "png");
    let output = temp_path(&format!("{name}_out"), "gif");
    write_source(&input);
    write_layer(&layer, layer_size.0, layer_size.1);

    let mut options = LayerOptions {
        input: input.clone(),
        layer: layer.clone(),
        output: output.clone(),
        format: OutputFormat::Gif,
        ..LayerOptions::default()
    };
    configure(&mut options);
    add_layer(&options).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    for p in [&input, &layer, &output] {
        let _ = std::fs::remove_file(p);
    }
    let mut sink = InMemorySink::default();
    let opts = DecodeOptions {
        gif_loop_mode: GifLoopMode::WebP,
    };
    decode_bytes(&bytes, &opts, &mut sink).unwrap();
    sink
}

fn px(sink: &InMemorySink, frame: usize, x: u32, y: u32) -> [u8; 4] {
    sink.frames[frame].0.get_pixel(x, y).0
}

#[test]
fn overlay_at_offset_keeps_timing_and_loop() {
    let sink = run("offset", (2, 2), |o| o.placement = Placement::At(Point::new(2, 2)));

    let spans: Vec<_> = sink.frames.iter().map(|(_, s, _)| (s.start, s.end)).collect();
    assert_eq!(spans, vec![(0, 100), (100, 200)]);
    assert_eq!(sink.end.as_ref().and_then(|c| c.loop_count), Some(2));

    assert_eq!(px(&sink, 0, 0, 0), [255, 0, 0, 255]);
    assert_eq!(px(&sink, 0, 3, 3), [255, 255, 255, 255]);
    assert_eq!(px(&sink, 1, 1, 1), [0, 0, 255, 255]);
    assert_eq!(px(&sink, 1, 2, 2), [255, 255, 255, 255]);
}

#[test]
fn negative_offsets_are_clipped() {
    let sink = run("negative", (2, 2), |o| o.placement = Placement::At(Point::new(-1, -1)));
    assert_eq!(px(&sink, 0, 0, 0), [255, 255, 255, 255]);
    assert_eq!(px(&sink, 0, 1, 1), [255, 0, 0, 255]);
}

#[test]
fn centered_and_tinted_layer() {
    let sink = run("center", (2, 2), |o| {
        o.placement = Placement::Center;
        o.tint = Color::rgba(0, 255, 0, 255);
    });
    assert_eq!(px(&sink, 0, 0, 0), [255, 0, 0, 255]);
    assert_eq!(px(&sink, 0, 1, 1), [0, 255, 0, 255]);
    assert_eq!(px(&sink, 0, 2, 2), [0, 255, 0, 255]);
    assert_eq!(px(&sink, 0, 3, 3), [255, 0, 0, 255]);
}

#[test]
fn fitted_layer_covers_the_canvas() {
    let sink = run("fit", (1, 1), |o| o.placement = Placement::Fit);
    assert!(sink.frames[0].0.pixels().all(|p| p.0 == [255, 255, 255, 255]));
}

#[test]
fn underlay_stays_behind_opaque_frames() {
    let sink = run("under", (4, 4), |o| o.mode = LayerMode::Under);
    assert_eq!(px(&sink, 0, 1, 1), [255, 0, 0, 255]);
    assert_eq!(px(&sink, 1, 1, 1), [0, 0, 255, 255]);
}

#[test]
fn missing_layer_is_reported() {
    let options = LayerOptions {
        layer: temp_path("missing", "png"),
        ..LayerOptions::default()
    };
    let err = add_layer(&options).unwrap_err();
    assert!(err.to_string().contains("missing"), "{err}");
}
