use std::io::Cursor;
use std::path::PathBuf;

use super::*;
use crate::foundation::core::Picture;

fn temp_png(name: &str, picture: &Picture) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "animtool_count_{name}_{}.png",
        std::process::id()
    ));
    let mut bytes = Vec::new();
    picture
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Left column transparent, the rest opaque with red = 10 * x.
fn gradient() -> Picture {
    Picture::from_fn(4, 3, |x, _| {
        if x == 0 {
            image::Rgba([0, 0, 0, 0])
        } else {
            image::Rgba([(x * 10) as u8, 0, 0, 255])
        }
    })
}

#[test]
fn predicate_grammar() {
    let p: PixelPredicate = "15<red<=100:alpha=0".parse().unwrap();
    assert_eq!(p.red.lower, Bound::Excluded(15));
    assert_eq!(p.red.upper, Bound::Included(100));
    assert_eq!(p.alpha.equal, Some(0));
    assert_eq!(p.green, ChannelPredicate::default());

    let p: PixelPredicate = "10<=blue<20".parse().unwrap();
    assert!(p.matches([0, 0, 10, 255]));
    assert!(p.matches([0, 0, 19, 255]));
    assert!(!p.matches([0, 0, 20, 255]));
    assert!(!p.matches([0, 0, 9, 255]));

    assert_eq!("".parse::<PixelPredicate>().unwrap(), PixelPredicate::default());
}

#[test]
fn blue_is_checked_against_its_own_bounds() {
    let p: PixelPredicate = "green=0:blue=200".parse().unwrap();
    assert!(p.matches([1, 0, 200, 1]));
    assert!(!p.matches([1, 0, 0, 1]));
}

#[test]
fn malformed_predicates_are_input_errors() {
    for text in ["purple=1", "red>=3", "5>red", "red=abc", "<red", "123"] {
        let err = text.parse::<PixelPredicate>().unwrap_err();
        assert!(matches!(err, AnimError::Input(_)), "{text}: {err}");
    }
}

#[test]
fn region_is_clamped_to_the_picture() {
    let size = Size::new(4, 3);
    assert_eq!(Region::default().clamp_to(size), Rect::new(0, 0, 4, 3));
    let r = Region {
        x: 2,
        y: 1,
        width: Some(10),
        height: None,
    };
    assert_eq!(r.clamp_to(size), Rect::new(2, 1, 2, 2));
    let outside = Region {
        x: 9,
        ..Region::default()
    };
    assert!(outside.clamp_to(size).is_empty());
}

#[test]
fn counts_matching_pixels_in_region() {
    let path = temp_png("region", &gradient());
    let transparent: PixelPredicate = "alpha=0".parse().unwrap();
    let reddish: PixelPredicate = "15<red<=30:alpha=255".parse().unwrap();

    assert_eq!(count_pixels(&path, 0, Region::default(), &transparent).unwrap(), 3);
    assert_eq!(count_pixels(&path, 0, Region::default(), &reddish).unwrap(), 6);
    let top_row = Region {
        height: Some(1),
        ..Region::default()
    };
    assert_eq!(count_pixels(&path, 0, top_row, &reddish).unwrap(), 2);

    let err = count_pixels(&path, 1, Region::default(), &transparent).unwrap_err();
    let _ = std::fs::remove_file(&path);
    assert!(matches!(err, AnimError::Input(_)));
    assert!(err.to_string().contains("out of range"));
}
