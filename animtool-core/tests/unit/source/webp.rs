use super::*;
use crate::source::InMemorySink;

fn lossless_animation(colors: &[[u8; 4]], step_ms: i32) -> Vec<u8> {
    let options = webp_animation::EncoderOptions {
        encoding_config: Some(webp_animation::EncodingConfig {
            encoding_type: webp_animation::EncodingType::Lossless,
            quality: 100.0,
            method: 4,
        }),
        ..Default::default()
    };
    let mut enc = webp_animation::Encoder::new_with_options((4, 4), options).unwrap();
    let mut ts = 0;
    for &color in colors {
        let pic = Picture::from_pixel(4, 4, image::Rgba(color));
        enc.add_frame(pic.as_raw(), ts).unwrap();
        ts += step_ms;
    }
    enc.finalize(ts).unwrap().to_vec()
}

#[test]
fn opaque_frames_decode_exactly() {
    let colors = [[200, 100, 50, 255], [10, 200, 30, 255], [1, 254, 128, 255]];
    let bytes = lossless_animation(&colors, 70);

    let mut sink = InMemorySink::default();
    run(&bytes, &mut sink).unwrap();

    let pixels: Vec<_> = sink.frames.iter().map(|(p, _, _)| p.get_pixel(3, 3).0).collect();
    assert_eq!(pixels, colors.to_vec());
    let spans: Vec<_> = sink.frames.iter().map(|(_, s, _)| (s.start, s.end)).collect();
    assert_eq!(spans, vec![(0, 70), (70, 140), (140, 210)]);
    assert_eq!(sink.end_calls, 1);
}

#[test]
fn stop_after_first_frame_still_ends() {
    let bytes = lossless_animation(&[[0, 0, 0, 255], [255, 255, 255, 255]], 50);
    let mut sink = InMemorySink {
        stop_after: Some(1),
        ..InMemorySink::default()
    };
    run(&bytes, &mut sink).unwrap();
    assert_eq!(sink.frames.len(), 1);
    assert_eq!(sink.end_calls, 1);
}
