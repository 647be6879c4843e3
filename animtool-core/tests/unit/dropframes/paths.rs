use super::*;

fn target<'a>(output: Option<&'a str>, output_dir: Option<&'a str>) -> OutputTarget<'a> {
    OutputTarget {
        input: Path::new("media/in.gif"),
        output: output.map(Path::new),
        output_dir: output_dir.map(Path::new),
    }
}

#[test]
fn explicit_file_name_wins() {
    let name = Some(Path::new("thumb.gif"));
    assert_eq!(
        target(None, Some("out")).path_for(0, 1, name, "gif"),
        PathBuf::from("out/thumb.gif")
    );
    assert_eq!(
        target(Some("x.webp"), None).path_for(1, 0, name, "gif"),
        PathBuf::from("thumb.gif")
    );
}

#[test]
fn output_dir_uses_indices() {
    let t = target(Some("ignored.webp"), Some("out"));
    assert_eq!(t.path_for(0, 0, None, "webp"), PathBuf::from("out/t0d0.webp"));
    assert_eq!(t.path_for(2, 1, None, "gif"), PathBuf::from("out/t2d1.gif"));
}

#[test]
fn output_path_is_verbatim_for_the_first_destination() {
    let t = target(Some("res/out.webp"), None);
    assert_eq!(t.path_for(0, 0, None, "gif"), PathBuf::from("res/out.webp"));
    assert_eq!(t.path_for(0, 1, None, "gif"), PathBuf::from("res/out_t0d1.webp"));
    assert_eq!(t.path_for(1, 0, None, "webp"), PathBuf::from("res/out_t1d0.webp"));

    let bare = target(Some("out"), None);
    assert_eq!(bare.path_for(0, 1, None, "webp"), PathBuf::from("out_t0d1"));
}

#[test]
fn input_sibling_takes_the_destination_extension() {
    let t = target(None, None);
    assert_eq!(t.path_for(0, 0, None, "webp"), PathBuf::from("media/in_t0d0.webp"));
    assert_eq!(t.path_for(1, 2, None, "gif"), PathBuf::from("media/in_t1d2.gif"));
}
