//! Palette construction for indexed output.
//!
//! Index 0 is reserved for transparency; visible colors occupy indices `1..=MAX_COLORS`.
//! Frames with few enough distinct colors get an exact palette, others go through Wu's
//! moment-based box splitting over a 33x33x33 histogram.

use std::collections::HashMap;

use crate::foundation::core::Picture;

/// Pixels with alpha below this map to the transparency index.
pub(crate) const ALPHA_THRESHOLD: u8 = 64;
/// Palette index reserved for transparent pixels.
pub(crate) const TRANSPARENT_INDEX: u8 = 0;
/// Visible palette entries available per frame.
pub(crate) const MAX_COLORS: usize = 255;

/// Visible colors of one frame; entry `i` is written at palette index `i + 1`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    /// Build the palette for the visible pixels of `picture`.
    pub(crate) fn for_picture(picture: &Picture) -> Self {
        match exact_colors(picture, MAX_COLORS) {
            Some(colors) => Self { colors },
            None => Self {
                colors: wu_quantize(picture, MAX_COLORS),
            },
        }
    }

    pub(crate) fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    /// 256-entry RGB table with the transparency slot at index 0.
    pub(crate) fn to_color_table(&self) -> Vec<u8> {
        let mut table = vec![0u8; 256 * 3];
        for (i, c) in self.colors.iter().enumerate() {
            let at = (i + 1) * 3;
            table[at..at + 3].copy_from_slice(c);
        }
        table
    }

    fn nearest(&self, rgb: [u8; 3]) -> u8 {
        let dist = |c: &[u8; 3]| -> u32 {
            let dr = i32::from(c[0]) - i32::from(rgb[0]);
            let dg = i32::from(c[1]) - i32::from(rgb[1]);
            let db = i32::from(c[2]) - i32::from(rgb[2]);
            (dr * dr + dg * dg + db * db) as u32
        };
        self.colors
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| dist(c))
            .map_or(TRANSPARENT_INDEX, |(i, _)| (i + 1) as u8)
    }
}

/// Pixel to palette index mapping with a cache scoped to one frame.
#[derive(Debug)]
pub(crate) struct IndexMapper<'p> {
    palette: &'p Palette,
    cache: HashMap<[u8; 3], u8>,
}

impl<'p> IndexMapper<'p> {
    pub(crate) fn new(palette: &'p Palette) -> Self {
        Self {
            palette,
            cache: HashMap::new(),
        }
    }

    pub(crate) fn index_of(&mut self, rgba: [u8; 4]) -> u8 {
        if rgba[3] < ALPHA_THRESHOLD {
            return TRANSPARENT_INDEX;
        }
        let rgb = [rgba[0], rgba[1], rgba[2]];
        let palette = self.palette;
        *self.cache.entry(rgb).or_insert_with(|| palette.nearest(rgb))
    }

    /// Index every pixel of `picture` in row-major order.
    pub(crate) fn map_picture(&mut self, picture: &Picture) -> Vec<u8> {
        picture.pixels().map(|p| self.index_of(p.0)).collect()
    }
}

fn visible_pixels(picture: &Picture) -> impl Iterator<Item = [u8; 3]> + '_ {
    picture
        .pixels()
        .filter(|p| p.0[3] >= ALPHA_THRESHOLD)
        .map(|p| [p.0[0], p.0[1], p.0[2]])
}

/// Distinct visible colors in first-seen order, or `None` when there are more than `limit`.
fn exact_colors(picture: &Picture, limit: usize) -> Option<Vec<[u8; 3]>> {
    let mut seen = HashMap::new();
    let mut colors = Vec::new();
    for rgb in visible_pixels(picture) {
        if seen.insert(rgb, ()).is_none() {
            if colors.len() == limit {
                return None;
            }
            colors.push(rgb);
        }
    }
    Some(colors)
}

const SIDE: usize = 33;

fn at(r: usize, g: usize, b: usize) -> usize {
    (r * SIDE + g) * SIDE + b
}

#[derive(Clone, Copy, Debug)]
enum Axis {
    Red,
    Green,
    Blue,
}

#[derive(Clone, Copy, Debug, Default)]
struct ColorBox {
    r0: usize,
    r1: usize,
    g0: usize,
    g1: usize,
    b0: usize,
    b1: usize,
    vol: usize,
}

/// Cumulative color moments over the histogram lattice.
struct Moments {
    wt: Vec<f64>,
    mr: Vec<f64>,
    mg: Vec<f64>,
    mb: Vec<f64>,
    m2: Vec<f64>,
}

impl Moments {
    fn from_picture(picture: &Picture) -> Self {
        let len = SIDE * SIDE * SIDE;
        let mut m = Self {
            wt: vec![0.0; len],
            mr: vec![0.0; len],
            mg: vec![0.0; len],
            mb: vec![0.0; len],
            m2: vec![0.0; len],
        };
        for [r, g, b] in visible_pixels(picture) {
            let i = at(
                usize::from(r >> 3) + 1,
                usize::from(g >> 3) + 1,
                usize::from(b >> 3) + 1,
            );
            let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
            m.wt[i] += 1.0;
            m.mr[i] += r;
            m.mg[i] += g;
            m.mb[i] += b;
            m.m2[i] += r * r + g * g + b * b;
        }
        m.accumulate();
        m
    }

    fn accumulate(&mut self) {
        for r in 1..SIDE {
            let mut area = [[0.0f64; SIDE]; 5];
            for g in 1..SIDE {
                let mut line = [0.0f64; 5];
                for b in 1..SIDE {
                    let i = at(r, g, b);
                    let prev = at(r - 1, g, b);
                    for (k, moment) in [
                        &mut self.wt,
                        &mut self.mr,
                        &mut self.mg,
                        &mut self.mb,
                        &mut self.m2,
                    ]
                    .into_iter()
                    .enumerate()
                    {
                        line[k] += moment[i];
                        area[k][b] += line[k];
                        moment[i] = moment[prev] + area[k][b];
                    }
                }
            }
        }
    }

    fn variance(&self, c: &ColorBox) -> f64 {
        let w = vol(c, &self.wt);
        if w == 0.0 {
            return 0.0;
        }
        let dr = vol(c, &self.mr);
        let dg = vol(c, &self.mg);
        let db = vol(c, &self.mb);
        vol(c, &self.m2) - (dr * dr + dg * dg + db * db) / w
    }

    fn maximize(
        &self,
        c: &ColorBox,
        axis: Axis,
        first: usize,
        last: usize,
        whole: [f64; 4],
    ) -> (f64, Option<usize>) {
        let base = [
            bottom(c, axis, &self.mr),
            bottom(c, axis, &self.mg),
            bottom(c, axis, &self.mb),
            bottom(c, axis, &self.wt),
        ];
        let mut max = 0.0;
        let mut cut = None;
        for pos in first..last {
            let half = [
                base[0] + top(c, axis, pos, &self.mr),
                base[1] + top(c, axis, pos, &self.mg),
                base[2] + top(c, axis, pos, &self.mb),
                base[3] + top(c, axis, pos, &self.wt),
            ];
            if half[3] == 0.0 {
                continue;
            }
            let rest = [
                whole[0] - half[0],
                whole[1] - half[1],
                whole[2] - half[2],
                whole[3] - half[3],
            ];
            if rest[3] == 0.0 {
                continue;
            }
            let score = (half[0] * half[0] + half[1] * half[1] + half[2] * half[2]) / half[3]
                + (rest[0] * rest[0] + rest[1] * rest[1] + rest[2] * rest[2]) / rest[3];
            if score > max {
                max = score;
                cut = Some(pos);
            }
        }
        (max, cut)
    }

    /// Split `a` along its best axis, moving the upper part into `b`.
    fn cut(&self, a: &mut ColorBox, b: &mut ColorBox) -> bool {
        let whole = [
            vol(a, &self.mr),
            vol(a, &self.mg),
            vol(a, &self.mb),
            vol(a, &self.wt),
        ];
        let (max_r, cut_r) = self.maximize(a, Axis::Red, a.r0 + 1, a.r1, whole);
        let (max_g, cut_g) = self.maximize(a, Axis::Green, a.g0 + 1, a.g1, whole);
        let (max_b, cut_b) = self.maximize(a, Axis::Blue, a.b0 + 1, a.b1, whole);

        let (axis, pos) = if max_r >= max_g && max_r >= max_b {
            (Axis::Red, cut_r)
        } else if max_g >= max_r && max_g >= max_b {
            (Axis::Green, cut_g)
        } else {
            (Axis::Blue, cut_b)
        };
        let Some(pos) = pos else {
            return false;
        };

        b.r1 = a.r1;
        b.g1 = a.g1;
        b.b1 = a.b1;
        match axis {
            Axis::Red => {
                b.r0 = pos;
                a.r1 = pos;
                b.g0 = a.g0;
                b.b0 = a.b0;
            }
            Axis::Green => {
                b.g0 = pos;
                a.g1 = pos;
                b.r0 = a.r0;
                b.b0 = a.b0;
            }
            Axis::Blue => {
                b.b0 = pos;
                a.b1 = pos;
                b.r0 = a.r0;
                b.g0 = a.g0;
            }
        }
        a.vol = (a.r1 - a.r0) * (a.g1 - a.g0) * (a.b1 - a.b0);
        b.vol = (b.r1 - b.r0) * (b.g1 - b.g0) * (b.b1 - b.b0);
        true
    }
}

fn vol(c: &ColorBox, m: &[f64]) -> f64 {
    m[at(c.r1, c.g1, c.b1)] - m[at(c.r1, c.g1, c.b0)] - m[at(c.r1, c.g0, c.b1)]
        + m[at(c.r1, c.g0, c.b0)]
        - m[at(c.r0, c.g1, c.b1)]
        + m[at(c.r0, c.g1, c.b0)]
        + m[at(c.r0, c.g0, c.b1)]
        - m[at(c.r0, c.g0, c.b0)]
}

fn bottom(c: &ColorBox, axis: Axis, m: &[f64]) -> f64 {
    match axis {
        Axis::Red => {
            -m[at(c.r0, c.g1, c.b1)] + m[at(c.r0, c.g1, c.b0)] + m[at(c.r0, c.g0, c.b1)]
                - m[at(c.r0, c.g0, c.b0)]
        }
        Axis::Green => {
            -m[at(c.r1, c.g0, c.b1)] + m[at(c.r1, c.g0, c.b0)] + m[at(c.r0, c.g0, c.b1)]
                - m[at(c.r0, c.g0, c.b0)]
        }
        Axis::Blue => {
            -m[at(c.r1, c.g1, c.b0)] + m[at(c.r1, c.g0, c.b0)] + m[at(c.r0, c.g1, c.b0)]
                - m[at(c.r0, c.g0, c.b0)]
        }
    }
}

fn top(c: &ColorBox, axis: Axis, pos: usize, m: &[f64]) -> f64 {
    match axis {
        Axis::Red => {
            m[at(pos, c.g1, c.b1)] - m[at(pos, c.g1, c.b0)] - m[at(pos, c.g0, c.b1)]
                + m[at(pos, c.g0, c.b0)]
        }
        Axis::Green => {
            m[at(c.r1, pos, c.b1)] - m[at(c.r1, pos, c.b0)] - m[at(c.r0, pos, c.b1)]
                + m[at(c.r0, pos, c.b0)]
        }
        Axis::Blue => {
            m[at(c.r1, c.g1, pos)] - m[at(c.r1, c.g0, pos)] - m[at(c.r0, c.g1, pos)]
                + m[at(c.r0, c.g0, pos)]
        }
    }
}

/// Wu's color quantizer: at most `max_colors` box means of the visible pixels.
pub(crate) fn wu_quantize(picture: &Picture, max_colors: usize) -> Vec<[u8; 3]> {
    if max_colors == 0 {
        return Vec::new();
    }
    let m = Moments::from_picture(picture);

    let mut boxes = vec![ColorBox::default(); max_colors];
    boxes[0] = ColorBox {
        r1: SIDE - 1,
        g1: SIDE - 1,
        b1: SIDE - 1,
        ..ColorBox::default()
    };
    let mut variance = vec![0.0f64; max_colors];
    let mut count = max_colors;
    let mut next = 0;
    let mut i = 1;
    while i < max_colors {
        let mut a = boxes[next];
        let mut b = ColorBox::default();
        if m.cut(&mut a, &mut b) {
            boxes[next] = a;
            boxes[i] = b;
            variance[next] = if a.vol > 1 { m.variance(&a) } else { 0.0 };
            variance[i] = if b.vol > 1 { m.variance(&b) } else { 0.0 };
        } else {
            // Unsplittable; never pick it again and retry this slot.
            variance[next] = 0.0;
            i -= 1;
        }

        next = 0;
        let mut best = variance[0];
        for (k, &v) in variance.iter().enumerate().take(i + 1).skip(1) {
            if v > best {
                best = v;
                next = k;
            }
        }
        if best <= 0.0 {
            count = i + 1;
            break;
        }
        i += 1;
    }

    boxes[..count]
        .iter()
        .filter_map(|c| {
            let w = vol(c, &m.wt);
            (w > 0.0).then(|| {
                [
                    (vol(c, &m.mr) / w) as u8,
                    (vol(c, &m.mg) / w) as u8,
                    (vol(c, &m.mb) / w) as u8,
                ]
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/encode/quantize.rs"]
mod tests;
