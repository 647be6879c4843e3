use std::borrow::Cow;

use super::*;
use crate::source::{DecodeOptions, InMemorySink, decode_bytes};

const PALETTE: [u8; 12] = [0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255];
const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn record(
    rect: (u16, u16, u16, u16),
    index: u8,
    delay: u16,
    dispose: gif::DisposalMethod,
) -> gif::Frame<'static> {
    let (left, top, width, height) = rect;
    gif::Frame {
        left,
        top,
        width,
        height,
        delay,
        dispose,
        buffer: Cow::Owned(vec![index; usize::from(width) * usize::from(height)]),
        ..Default::default()
    }
}

fn encode(
    size: (u16, u16),
    repeat: Option<gif::Repeat>,
    frames: &[gif::Frame<'static>],
) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut enc = gif::Encoder::new(&mut out, size.0, size.1, &PALETTE).unwrap();
        if let Some(r) = repeat {
            enc.set_repeat(r).unwrap();
        }
        for f in frames {
            enc.write_frame(f).unwrap();
        }
    }
    out
}

fn decode(bytes: &[u8], mode: GifLoopMode) -> InMemorySink {
    let mut sink = InMemorySink::default();
    let opts = DecodeOptions {
        gif_loop_mode: mode,
    };
    decode_bytes(bytes, &opts, &mut sink).unwrap();
    sink
}

fn three_frames() -> Vec<gif::Frame<'static>> {
    vec![
        record((0, 0, 4, 4), 1, 10, gif::DisposalMethod::Keep),
        record((1, 1, 2, 2), 2, 10, gif::DisposalMethod::Previous),
        record((0, 0, 1, 1), 3, 5, gif::DisposalMethod::Background),
    ]
}

#[test]
fn composites_with_disposal_and_contiguous_spans() {
    let bytes = encode((4, 4), None, &three_frames());
    let sink = decode(&bytes, GifLoopMode::Compatible);

    let start = sink.start.as_ref().unwrap();
    assert_eq!((start.width, start.height), (4, 4));
    assert_eq!(start.format, SourceFormat::Gif);

    let spans: Vec<_> = sink.frames.iter().map(|(_, s, _)| (s.start, s.end)).collect();
    assert_eq!(spans, vec![(0, 100), (100, 200), (200, 250)]);

    let (f1, _, info1) = &sink.frames[1];
    assert_eq!(f1.get_pixel(0, 0).0, RED);
    assert_eq!(f1.get_pixel(1, 1).0, GREEN);
    assert_eq!(f1.get_pixel(2, 2).0, GREEN);
    assert_eq!(info1.unwrap().disposal, Disposal::Previous);

    // Restore-previous brought the red background back before frame 2.
    let (f2, _, _) = &sink.frames[2];
    assert_eq!(f2.get_pixel(0, 0).0, BLUE);
    assert_eq!(f2.get_pixel(1, 1).0, RED);
    assert_eq!(sink.end_calls, 1);
}

#[test]
fn transparency_index_keeps_underlying_pixels() {
    let mut overlay = record((0, 0, 2, 1), 2, 10, gif::DisposalMethod::Keep);
    overlay.buffer = Cow::Owned(vec![0, 2]);
    overlay.transparent = Some(0);
    let frames = vec![record((0, 0, 2, 1), 1, 10, gif::DisposalMethod::Keep), overlay];
    let sink = decode(&encode((2, 1), None, &frames), GifLoopMode::Compatible);

    let (pic, _, info) = &sink.frames[1];
    assert_eq!(pic.get_pixel(0, 0).0, RED);
    assert_eq!(pic.get_pixel(1, 0).0, GREEN);
    assert_eq!(info.unwrap().transparent, Some(0));
}

#[test]
fn loop_count_semantics_per_mode() {
    let finite = encode((4, 4), Some(gif::Repeat::Finite(3)), &three_frames());
    let infinite = encode((4, 4), Some(gif::Repeat::Infinite), &three_frames());
    let absent = encode((4, 4), None, &three_frames());

    let end = |bytes: &[u8], mode| decode(bytes, mode).end.unwrap().loop_count;
    assert_eq!(end(&finite, GifLoopMode::Compatible), Some(3));
    assert_eq!(end(&infinite, GifLoopMode::Compatible), None);
    assert_eq!(end(&absent, GifLoopMode::Compatible), None);

    assert_eq!(end(&finite, GifLoopMode::WebP), Some(4));
    assert_eq!(end(&infinite, GifLoopMode::WebP), Some(0));
    assert_eq!(end(&absent, GifLoopMode::WebP), Some(1));
}

#[test]
fn resolve_loop_count_edge_cases() {
    assert_eq!(resolve_loop_count(GifLoopMode::WebP, None, 1), None);
    assert_eq!(resolve_loop_count(GifLoopMode::WebP, Some(u16::MAX), 2), Some(u16::MAX));
    assert_eq!(resolve_loop_count(GifLoopMode::Compatible, Some(0), 2), None);
}

#[test]
fn stop_request_still_reaches_on_end() {
    let bytes = encode((4, 4), Some(gif::Repeat::Finite(2)), &three_frames());
    let mut sink = InMemorySink {
        stop_after: Some(1),
        ..Default::default()
    };
    decode_bytes(&bytes, &DecodeOptions::default(), &mut sink).unwrap();
    assert_eq!(sink.frames.len(), 1);
    assert_eq!(sink.end_calls, 1);
}

#[test]
fn stop_at_start_delivers_no_frames() {
    let bytes = encode((4, 4), None, &three_frames());
    let mut sink = InMemorySink {
        stop_after: Some(0),
        ..Default::default()
    };
    decode_bytes(&bytes, &DecodeOptions::default(), &mut sink).unwrap();
    assert!(sink.start.is_some());
    assert!(sink.frames.is_empty());
    assert_eq!(sink.end_calls, 1);
}

#[test]
fn background_color_rules() {
    assert_eq!(background_color(Some(&PALETTE), Some(1), None), Color::rgba(255, 0, 0, 255));
    assert_eq!(background_color(Some(&PALETTE), Some(1), Some(1)), Color::TRANSPARENT);
    assert_eq!(background_color(Some(&PALETTE), Some(9), None), Color::WHITE);
    assert_eq!(background_color(None, Some(0), None), Color::WHITE);
}

#[test]
fn compositor_background_disposal_clears_to_transparent() {
    let mut comp = Compositor::new(Size::new(3, 3));
    let rect = Rect::new(0, 0, 3, 3);
    comp.begin_frame(Disposal::Background);
    comp.paint(rect, &[1; 9], &PALETTE, None).unwrap();
    comp.dispose(Rect::new(1, 1, 5, 5), Disposal::Background);

    assert_eq!(comp.canvas().get_pixel(0, 0).0, RED);
    assert_eq!(comp.canvas().get_pixel(2, 2).0, [0, 0, 0, 0]);
}

#[test]
fn compositor_rejects_short_index_buffers() {
    let mut comp = Compositor::new(Size::new(2, 2));
    let err = comp.paint(Rect::new(0, 0, 2, 2), &[1; 3], &PALETTE, None).unwrap_err();
    assert!(err.to_string().contains("decode error:"));
}

#[test]
fn out_of_range_indices_paint_black() {
    let mut comp = Compositor::new(Size::new(1, 1));
    comp.paint(Rect::new(0, 0, 1, 1), &[200], &PALETTE, None).unwrap();
    assert_eq!(comp.canvas().get_pixel(0, 0).0, [0, 0, 0, 255]);
}
