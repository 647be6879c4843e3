use super::*;

#[test]
fn argb_and_rgba_packing_agree() {
    let c = Color::rgba(0x11, 0x22, 0x33, 0x44);
    assert_eq!(c.to_argb(), 0x4411_2233);
    assert_eq!(c.to_rgba_u32(), 0x1122_3344);
    assert_eq!(Color::from_argb(0x4411_2233), c);
    assert_eq!(Color::from_rgba_u32(0x1122_3344), c);
    assert_eq!(Color::from_pixel(c.to_pixel()), c);
}

#[test]
fn color_displays_as_hex_literal() {
    assert_eq!(Color::WHITE.to_string(), "0xFFFFFFFF");
    assert_eq!(Color::rgba(1, 2, 3, 4).to_string(), "0x01020304");
}

#[test]
fn fit_to_centers_the_free_axis() {
    assert_eq!(
        fit_to(Size::new(400, 300), Size::new(100, 100)),
        Rect::new(50, 0, 300, 300)
    );
    assert_eq!(
        fit_to(Size::new(300, 400), Size::new(100, 100)),
        Rect::new(0, 50, 300, 300)
    );
    assert_eq!(
        fit_to(Size::new(400, 300), Size::new(0, 10)),
        Rect::default()
    );
}

#[test]
fn rect_clip_and_containment() {
    let canvas = Size::new(10, 10);
    assert!(Rect::new(2, 2, 8, 8).fits_in(canvas));
    assert!(!Rect::new(3, 2, 8, 8).fits_in(canvas));
    assert_eq!(Rect::new(6, 8, 10, 10).clip_to(canvas), Rect::new(6, 8, 4, 2));
    assert!(Rect::new(12, 0, 3, 3).clip_to(canvas).is_empty());
}

#[test]
fn gravity_parses_center_only() {
    assert_eq!("center".parse::<Gravity>().unwrap(), Gravity::Center);
    assert_eq!("CENTER".parse::<Gravity>().unwrap(), Gravity::Center);
    assert!("north".parse::<Gravity>().is_err());
}

#[test]
fn time_range_rejects_backwards_intervals() {
    assert!(TimeRange::new(10, 5).is_err());
    let r = TimeRange::new(5, 5).unwrap();
    assert!(r.is_empty());
    assert_eq!(TimeRange::new(5, 45).unwrap().duration(), 40);
}

#[test]
fn rounding_is_half_away_from_zero() {
    assert_eq!(round_to_u32(2.5), 3);
    assert_eq!(round_to_u32(2.4999), 2);
    assert_eq!(round_to_u32(-3.0), 0);
}

#[test]
fn color_literals() {
    assert_eq!("0x11223344".parse::<Color>().unwrap(), Color::rgba(0x11, 0x22, 0x33, 0x44));
    assert_eq!("0xFF0000".parse::<Color>().unwrap(), Color::rgba(255, 0, 0, 255));
    assert_eq!("0x00000000".parse::<Color>().unwrap(), Color::TRANSPARENT);
    assert_eq!("255".parse::<Color>().unwrap(), Color::rgba(0, 0, 0, 255));
    assert_eq!("4294967295".parse::<Color>().unwrap(), Color::WHITE);

    for bad in ["0x", "0x123456789", "0xGG", "red", "-1"] {
        let err = bad.parse::<Color>().unwrap_err();
        assert!(matches!(err, AnimError::Input(_)), "{bad}");
    }
}
