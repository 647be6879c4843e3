use std::path::PathBuf;

use super::*;

fn temp_gif(name: &str, repeat: gif::Repeat) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "animtool_info_{name}_{}.gif",
        std::process::id()
    ));
    let palette = [0u8, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255];
    let mut bytes = Vec::new();
    {
        let mut enc = gif::Encoder::new(&mut bytes, 4, 4, &palette).unwrap();
        enc.set_repeat(repeat).unwrap();
        for (color, delay) in [(1u8, 10u16), (2, 10)] {
            let mut frame = gif::Frame {
                width: 2,
                height: 2,
                left: 1,
                top: 1,
                delay,
                transparent: Some(0),
                dispose: gif::DisposalMethod::Background,
                ..gif::Frame::default()
            };
            frame.buffer = std::borrow::Cow::Owned(vec![color; 4]);
            enc.write_frame(&frame).unwrap();
        }
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn summary_stops_before_frames() {
    let path = temp_gif("summary", gif::Repeat::Finite(3));
    let report = inspect(&path, false, &DecodeOptions::default()).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(report.format, SourceFormat::Gif);
    assert_eq!((report.width, report.height), (4, 4));
    assert_eq!(report.loop_count, Some(3));
    assert_eq!(report.gif.map(|g| g.global_palette_len), Some(4));
    assert!(report.frames.is_none());
    assert!(report.total_duration.is_none());
    assert!(!report.to_string().contains("image#"));
}

#[test]
fn detail_lists_every_frame() {
    let path = temp_gif("detail", gif::Repeat::Infinite);
    let report = inspect(&path, true, &DecodeOptions::default()).unwrap();
    let _ = std::fs::remove_file(&path);

    let frames = report.frames.as_ref().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].index, 1);
    assert_eq!(frames[1].span, TimeRange::new(100, 200).unwrap());
    let g = frames[0].gif.unwrap();
    assert_eq!(g.transparent, Some(0));
    assert_eq!(g.disposal, Disposal::Background);
    assert_eq!(report.total_duration, Some(200));
    assert_eq!(report.loop_count, None);

    let text = report.to_string();
    assert!(text.starts_with("Canvas size 4x4\n"), "{text}");
    assert!(text.contains("image#1 duration=100 [GIF] trans=0 [1:1:2:2] disp=BG(2)"), "{text}");
    assert!(text.contains("Total duration 200"), "{text}");
}

#[test]
fn report_serializes_to_json() {
    let path = temp_gif("json", gif::Repeat::Finite(2));
    let report = inspect(&path, true, &DecodeOptions::default()).unwrap();
    let _ = std::fs::remove_file(&path);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["format"], "Gif");
    assert_eq!(json["loop_count"], 2);
    assert_eq!(json["frames"].as_array().map(Vec::len), Some(2));
    assert!(json["background"].as_str().unwrap().starts_with("0x"));
}
