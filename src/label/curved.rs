//! Laying out text along a curved line.
//!
//! The text is placed glyph by glyph along the longest free stretch of the
//! centreline, centred on that stretch if the glyphs are clear of the
//! registry there and slid along it otherwise. Each glyph is rotated to follow the
//! line between its neighbours. If the line turns too sharply for the text
//! to stay readable, the placement fails. Runs that are almost straight are
//! laid out on a straight line instead so the text doesn’t wobble.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, PI};
use kurbo::{Point, Rect, Vec2};
use crate::boxes::ObjectBoxes;
use crate::measure::Dimensions;
use crate::projection::Projection;
use crate::world::{Coord, WorldBox};
use super::GlyphPosition;


//------------ Configuration Constants ---------------------------------------

/// The largest angle between two neighbouring glyphs.
const MAX_GLYPH_TURN: f64 = FRAC_PI_3;

/// The factor glyph boxes are grown by.
const GLYPH_BOX_GROWTH: f64 = 0.9;


//------------ CurvedText ----------------------------------------------------

/// The outcome of a successful curved placement.
#[derive(Clone, Debug, Default)]
pub struct CurvedText {
    pub glyphs: Vec<GlyphPosition>,

    /// The box of each glyph.
    pub boxes: Vec<WorldBox>,
}


//------------ place_curved --------------------------------------------------

/// Lays out `text` along the centreline given by `coords`.
///
/// The dimensions of the glyphs in pixels are given in `dims`, one per
/// char of `text`. Returns `None` if the text can’t be placed.
pub fn place_curved(
    projection: &dyn Projection,
    registry: &ObjectBoxes,
    coords: &[Coord],
    text: &str,
    dims: &[Dimensions],
) -> Option<CurvedText> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || chars.len() != dims.len() {
        return None
    }
    let tile = projection.bounding_box();
    let mut blocking: Vec<_> = registry.world_boxes().copied().collect();
    blocking.extend(tile_blockers(&tile));

    let stretch = free_stretch(projection, coords, &blocking)?;
    let line: Vec<Point> = stretch.iter().map(|coord| {
        projection.world_to_pixel(*coord)
    }).collect();

    let total: f64 = dims.iter().map(|dim| dim.width).sum();
    let length = polyline_length(&line);
    if total > length {
        return None
    }

    let layout = Layout {
        projection, registry, tile, line: &line, length, chars: &chars, dims
    };
    candidate_starts(length, total).find_map(|start| layout.place(start))
}


//------------ Layout --------------------------------------------------------

/// A free stretch of line and the text to go along it.
struct Layout<'a> {
    projection: &'a dyn Projection,
    registry: &'a ObjectBoxes,
    tile: WorldBox,
    line: &'a [Point],
    length: f64,
    chars: &'a [char],
    dims: &'a [Dimensions],
}

impl<'a> Layout<'a> {
    /// Places the text starting `start` pixels along the line.
    ///
    /// Every glyph box has to be inside the tile and clear of the
    /// registry.
    fn place(&self, start: f64) -> Option<CurvedText> {
        let mut centres = glyph_centres(self.line, start, self.dims)?;
        let mut angles = glyph_angles(&centres);
        if is_upside_down(&angles) {
            let total: f64 = self.dims.iter().map(|dim| dim.width).sum();
            let mut line = self.line.to_vec();
            line.reverse();
            centres = glyph_centres(
                &line, self.length - start - total, self.dims
            )?;
            angles = glyph_angles(&centres);
        }
        if angles.windows(2).any(|pair| turn(pair[0], pair[1]) > MAX_GLYPH_TURN) {
            return None
        }
        straighten(&mut centres, &mut angles, self.dims);

        let mut res = CurvedText::default();
        for (((ch, dim), centre), angle) in self.chars.iter().zip(self.dims)
            .zip(&centres).zip(&angles)
        {
            let bbox = glyph_box(self.projection, *centre, *angle, *dim);
            if !bbox.inside(&self.tile)
                || self.registry.collides(&self.projection.pixel_box(&bbox))
            {
                return None
            }
            res.boxes.push(bbox);
            res.glyphs.push(GlyphPosition {
                ch: *ch,
                coord: self.projection.pixel_to_world(*centre),
                angle: *angle,
            });
        }
        Some(res)
    }
}

/// Returns the offsets along the line to try the text at.
///
/// The text is tried centred first and then slid along the line in steps
/// of half its length.
fn candidate_starts(length: f64, total: f64) -> impl Iterator<Item = f64> {
    let centred = (length - total) / 2.;
    let step = (total / 2.).max(1.);
    let count = ((length - total) / step).floor() as usize + 1;
    std::iter::once(centred).chain(
        (0..count).map(move |i| i as f64 * step).filter(move |start| {
            (start - centred).abs() >= 1.
        })
    )
}


//------------ Helpers -------------------------------------------------------

/// Returns the four boxes covering everything outside the tile.
fn tile_blockers(tile: &WorldBox) -> [WorldBox; 4] {
    [
        WorldBox {
            min_lat: tile.max_lat, max_lat: i32::MAX,
            min_lon: i32::MIN, max_lon: i32::MAX,
        },
        WorldBox {
            min_lat: i32::MIN, max_lat: tile.min_lat,
            min_lon: i32::MIN, max_lon: i32::MAX,
        },
        WorldBox {
            min_lat: i32::MIN, max_lat: i32::MAX,
            min_lon: i32::MIN, max_lon: tile.min_lon,
        },
        WorldBox {
            min_lat: i32::MIN, max_lat: i32::MAX,
            min_lon: tile.max_lon, max_lon: i32::MAX,
        },
    ]
}

/// Returns the longest run of segments not touching any blocking box.
fn free_stretch<'a>(
    projection: &dyn Projection, coords: &'a [Coord], blocking: &[WorldBox],
) -> Option<&'a [Coord]> {
    let mut best: Option<(usize, usize, f64)> = None;
    let mut start = 0;
    let mut length = 0.;
    for (i, pair) in coords.windows(2).enumerate() {
        let blocked = blocking.iter().any(|bbox| {
            bbox.intersects_segment(pair[0], pair[1])
        });
        if blocked {
            start = i + 1;
            length = 0.;
            continue
        }
        length += projection.world_to_pixel(pair[0]).distance(
            projection.world_to_pixel(pair[1])
        );
        if best.map(|(_, _, best)| length > best).unwrap_or(true) {
            best = Some((start, i + 1, length));
        }
    }
    best.map(|(start, end, _)| &coords[start..=end])
}

fn polyline_length(line: &[Point]) -> f64 {
    line.windows(2).map(|pair| pair[0].distance(pair[1])).sum()
}

/// Returns the point `distance` pixels along a line.
fn point_along(line: &[Point], distance: f64) -> Option<Point> {
    let mut left = distance;
    for pair in line.windows(2) {
        let seg = pair[0].distance(pair[1]);
        if seg > 0. && left <= seg {
            return Some(pair[0].lerp(pair[1], left / seg))
        }
        left -= seg;
    }
    line.last().copied()
}

/// Returns the centre of each glyph for text starting at `start`.
fn glyph_centres(
    line: &[Point], start: f64, dims: &[Dimensions]
) -> Option<Vec<Point>> {
    let mut pos = start + dims.first()?.width / 2.;
    let mut res = Vec::with_capacity(dims.len());
    for (i, dim) in dims.iter().enumerate() {
        res.push(point_along(line, pos)?);
        if let Some(next) = dims.get(i + 1) {
            pos += (dim.width + next.width) / 2.;
        }
    }
    Some(res)
}

/// Returns the bearing of a pixel vector clockwise from north.
fn bearing(vec: Vec2) -> f64 {
    vec.x.atan2(-vec.y)
}

/// Returns the angle of each glyph from its neighbours.
fn glyph_angles(centres: &[Point]) -> Vec<f64> {
    if centres.len() < 2 {
        return vec![FRAC_PI_2; centres.len()]
    }
    let last = centres.len() - 1;
    (0..centres.len()).map(|i| {
        let from = centres[i.saturating_sub(1)];
        let to = centres[(i + 1).min(last)];
        bearing(to - from)
    }).collect()
}

/// Returns whether the text would mostly be read upside down.
fn is_upside_down(angles: &[f64]) -> bool {
    if angles.is_empty() {
        return false
    }
    let sum: f64 = angles.iter().map(|angle| (angle - FRAC_PI_2).abs()).sum();
    sum / angles.len() as f64 > FRAC_PI_2
}

/// Returns the absolute angle between two bearings.
fn turn(a: f64, b: f64) -> f64 {
    let mut diff = (b - a) % (2. * PI);
    if diff > PI {
        diff -= 2. * PI
    }
    else if diff < -PI {
        diff += 2. * PI
    }
    diff.abs()
}

/// Lays the glyphs out on a straight line if they almost are.
fn straighten(centres: &mut [Point], angles: &mut [f64], dims: &[Dimensions]) {
    let (first, last) = match (centres.first(), centres.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return,
    };
    let dir = last - first;
    let len = dir.hypot();
    if len == 0. {
        return
    }
    let avg_height = dims.iter().map(|dim| dim.height).sum::<f64>()
        / dims.len() as f64;
    let straight = centres.iter().all(|centre| {
        ((*centre - first).cross(dir) / len).abs() <= avg_height / 3.
    });
    if !straight {
        return
    }
    let unit = dir / len;
    let angle = bearing(dir);
    let mut pos = 0.;
    for (i, centre) in centres.iter_mut().enumerate() {
        *centre = first + unit * pos;
        angles[i] = angle;
        if let (Some(dim), Some(next)) = (dims.get(i), dims.get(i + 1)) {
            pos += (dim.width + next.width) / 2.;
        }
    }
}

/// Returns the world box covering a rotated glyph.
fn glyph_box(
    projection: &dyn Projection, centre: Point, angle: f64, dim: Dimensions,
) -> WorldBox {
    let along = Vec2::new(angle.sin(), -angle.cos()) * (dim.width / 2.);
    let across = Vec2::new(angle.cos(), angle.sin()) * (dim.height / 2.);
    let corners = [
        centre + along + across,
        centre + along - across,
        centre - along + across,
        centre - along - across,
    ];
    let rect = corners.iter().fold(Rect::from_points(centre, centre), |rect, p| {
        rect.union_pt(*p)
    });
    let mut res = WorldBox::new(
        projection.pixel_to_world(Point::new(rect.x0, rect.y0)),
        projection.pixel_to_world(Point::new(rect.x1, rect.y1)),
    );
    res.increase_factor(GLYPH_BOX_GROWTH);
    res
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use kurbo::Size;
    use crate::projection::CosLatProjection;

    fn projection() -> CosLatProjection {
        CosLatProjection::new(
            WorldBox::new(Coord::new(0, 0), Coord::new(100_000, 100_000)),
            Size::new(500., 500.)
        )
    }

    fn line(proj: &CosLatProjection, points: &[(f64, f64)]) -> Vec<Coord> {
        points.iter().map(|&(x, y)| {
            proj.pixel_to_world(Point::new(x, y))
        }).collect()
    }

    fn dims(text: &str) -> Vec<Dimensions> {
        vec![Dimensions::new(7., 10.); text.chars().count()]
    }

    #[test]
    fn straight_text_is_centred() {
        let proj = projection();
        let coords = line(&proj, &[(100., 250.), (400., 250.)]);
        let res = place_curved(
            &proj, &ObjectBoxes::new(), &coords, "Main", &dims("Main")
        ).unwrap();
        assert_eq!(res.glyphs.len(), 4);
        assert_eq!(res.boxes.len(), 4);
        let first = proj.world_to_pixel(res.glyphs[0].coord);
        assert!((first.x - (250. - 14. + 3.5)).abs() < 1.);
        assert!(res.glyphs.iter().all(|g| (g.angle - FRAC_PI_2).abs() < 0.01));
        assert_eq!(res.glyphs[0].ch, 'M');
    }

    #[test]
    fn westward_lines_are_reversed() {
        let proj = projection();
        let coords = line(&proj, &[(400., 250.), (100., 250.)]);
        let res = place_curved(
            &proj, &ObjectBoxes::new(), &coords, "Elm", &dims("Elm")
        ).unwrap();
        let first = proj.world_to_pixel(res.glyphs[0].coord);
        let last = proj.world_to_pixel(res.glyphs[2].coord);
        assert!(first.x < last.x);
    }

    #[test]
    fn too_long_text_is_rejected() {
        let proj = projection();
        let coords = line(&proj, &[(100., 250.), (130., 250.)]);
        let text = "Long Street Name";
        let registry = ObjectBoxes::new();
        assert!(place_curved(&proj, &registry, &coords, text, &dims(text)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn sharp_turns_are_rejected() {
        let proj = projection();
        let coords = line(&proj, &[(100., 250.), (200., 250.), (110., 240.)]);
        let text = "Hairpin Road";
        assert!(
            place_curved(&proj, &ObjectBoxes::new(), &coords, text, &dims(text))
                .is_none()
        );
    }

    #[test]
    fn blocked_segments_are_avoided() {
        let proj = projection();
        let coords = line(
            &proj, &[(50., 250.), (150., 250.), (160., 250.), (450., 250.)]
        );
        let mut registry = ObjectBoxes::new();
        registry.add(
            WorldBox::new(
                proj.pixel_to_world(Point::new(120., 240.)),
                proj.pixel_to_world(Point::new(155., 260.)),
            ),
            &proj
        );
        let res = place_curved(
            &proj, &registry, &coords, "Road", &dims("Road")
        ).unwrap();
        let first = proj.world_to_pixel(res.glyphs[0].coord);
        assert!(first.x > 160.);
    }

    fn pixel_box(proj: &CosLatProjection, a: (f64, f64), b: (f64, f64)) -> WorldBox {
        WorldBox::new(
            proj.pixel_to_world(Point::new(a.0, a.1)),
            proj.pixel_to_world(Point::new(b.0, b.1)),
        )
    }

    #[test]
    fn glyphs_keep_clear_of_nearby_boxes() {
        let proj = projection();
        let coords = line(&proj, &[(100., 250.), (400., 250.)]);
        let mut registry = ObjectBoxes::new();
        registry.add(pixel_box(&proj, (200., 238.), (300., 248.)), &proj);
        let res = place_curved(
            &proj, &registry, &coords, "Main", &dims("Main")
        ).unwrap();
        assert_eq!(res.boxes.len(), 4);
        for bbox in &res.boxes {
            assert!(!registry.collides(&proj.pixel_box(bbox)));
        }
        let first = proj.world_to_pixel(res.glyphs[0].coord);
        assert!(first.x < 200.);
    }

    #[test]
    fn no_clear_spot_is_rejected() {
        let proj = projection();
        let coords = line(&proj, &[(100., 250.), (400., 250.)]);
        let mut registry = ObjectBoxes::new();
        registry.add(pixel_box(&proj, (90., 238.), (410., 248.)), &proj);
        assert!(
            place_curved(&proj, &registry, &coords, "Main", &dims("Main"))
                .is_none()
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn bends_follow_the_line() {
        let proj = projection();
        let coords = line(
            &proj, &[(100., 300.), (250., 250.), (400., 300.)]
        );
        let text = "Curved Avenue";
        let res = place_curved(
            &proj, &ObjectBoxes::new(), &coords, text, &dims(text)
        ).unwrap();
        assert!(res.glyphs[0].angle < FRAC_PI_2);
        assert!(res.glyphs[12].angle > FRAC_PI_2);
    }

    #[test]
    fn turn_wraps() {
        assert!((turn(-PI + 0.1, PI - 0.1) - 0.2).abs() < 1e-9);
        assert!((turn(0.5, 1.0) - 0.5).abs() < 1e-9);
    }
}
