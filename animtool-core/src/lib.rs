//! animtool edits animated raster images: frame-rate dropping, duration capping, cropping and
//! resizing into several outputs at once, and re-encoding to animated WebP or GIF.
//!
//! # Pipeline overview
//!
//! 1. **Decode**: bytes are sniffed and handed to a WebP, GIF or still-image adapter, which push
//!    a canonical event stream (`on_start`, `on_frame`, `on_end`) into a [`DecodeSink`].
//! 2. **Resample and transform**: [`DropFrames`] keeps or drops frames against a target period
//!    and fans every kept frame out to crop/resize destinations.
//! 3. **Encode**: one [`AnimEncoder`] per destination assembles the output file, which is written
//!    atomically on export.
//!
//! Every pixel buffer is straight-alpha RGBA8 ([`Picture`]). Frame intervals are half-open and in
//! milliseconds ([`TimeRange`]).
//!
//! Peripheral operations built on the same contract: [`inspect`] (metadata), [`count_pixels`]
//! (predicate pixel counter), [`average_opacity`] and [`add_layer`] (overlay/underlay).
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod dropframes;
mod encode;
mod foundation;
mod inspect;
mod layer;
mod picture;
mod source;

pub use dropframes::transform::{Destination, FrameTransform, SourceRect};
pub use dropframes::{DropFrames, DropFramesOptions, DropFramesReport, drop_frames};
pub use encode::{
    AnimEncoder, EncoderOptions, FrameOptions, OutputFormat, create_encoder, ensure_parent_dir,
    write_atomic,
};
pub use foundation::core::{Color, Gravity, Picture, Point, Rect, Size, TimeRange, fit_to};
pub use foundation::error::{AnimError, AnimResult};
pub use inspect::count::{ChannelPredicate, PixelPredicate, Region, count_pixels};
pub use inspect::info::{FrameReport, InfoReport, inspect};
pub use inspect::opacity::{average_opacity, frame_opacity};
pub use layer::{LayerOptions, Placement, add_layer};
pub use picture::cow::CowPicture;
pub use picture::{LayerMode, blend, crop, draw, draw_fit, new_canvas, rescale, tint};
pub use source::{
    Canvas, DecodeOptions, DecodeSink, Disposal, Flow, Frame, GifFrameInfo, GifLoopMode,
    GifScreenInfo, SourceFormat, decode_bytes, decode_file, sniff,
};
