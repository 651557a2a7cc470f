//! Simplification of merged polylines.

use crate::world::{Coord, MC2SCALE_TO_METER};


/// Drops points that deviate little from a straight line.
///
/// Walking from the first point, the polyline is extended as long as no
/// skipped point is further than `max_deviation` meters from the line
/// between the last kept point and the current one. The last point is
/// always kept. Polylines with fewer than three points are returned as
/// they are.
pub fn filter_open_polyline(coords: &[Coord], max_deviation: f64) -> Vec<Coord> {
    if coords.len() < 3 {
        return coords.to_vec()
    }
    let mut res = vec![coords[0]];
    let mut anchor = 0;
    for end in 2..coords.len() {
        let deviates = (anchor + 1..end).any(|k| {
            coords[k].line_distance(coords[anchor], coords[end])
                * MC2SCALE_TO_METER > max_deviation
        });
        if deviates {
            anchor = end - 1;
            res.push(coords[anchor]);
        }
    }
    res.extend(coords.last().copied());
    res
}

/// Removes every second point along nearly straight runs.
///
/// A point is skipped if it is at most `cutoff` world units away from the
/// line between its neighbours. The point after a skipped one is always
/// kept.
pub fn straighten(coords: &[Coord], cutoff: f64) -> Vec<Coord> {
    if coords.len() < 3 {
        return coords.to_vec()
    }
    let mut res = vec![coords[0]];
    let mut i = 0;
    while i + 2 < coords.len() {
        if coords[i + 1].line_distance(coords[i], coords[i + 2]) <= cutoff {
            res.push(coords[i + 2]);
            i += 2;
        }
        else {
            res.push(coords[i + 1]);
            i += 1;
        }
    }
    if i + 1 < coords.len() {
        res.extend(coords.last().copied());
    }
    res
}


//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    fn coords(list: &[(i32, i32)]) -> Vec<Coord> {
        list.iter().map(|&(lat, lon)| Coord::new(lat, lon)).collect()
    }

    #[test]
    fn filter_drops_collinear_points() {
        let line = coords(&[(0, 0), (1, 100), (0, 200), (-1, 300), (0, 400)]);
        assert_eq!(
            filter_open_polyline(&line, 1.),
            coords(&[(0, 0), (0, 400)])
        );
    }

    #[test]
    fn filter_keeps_corners() {
        let line = coords(&[(0, 0), (0, 1000), (1000, 1000), (1000, 2000)]);
        assert_eq!(filter_open_polyline(&line, 1.), line);
    }

    #[test]
    fn short_lines_unchanged() {
        let line = coords(&[(0, 0), (0, 1000)]);
        assert_eq!(filter_open_polyline(&line, 1000.), line);
        assert_eq!(straighten(&line, 1000.), line);
    }

    #[test]
    fn straighten_skips_alternate_points() {
        let line = coords(&[(0, 0), (10, 1000), (0, 2000), (10, 3000), (0, 4000)]);
        assert_eq!(straighten(&line, 300.), coords(&[(0, 0), (0, 2000), (0, 4000)]));
        let zigzag = coords(&[(0, 0), (1000, 1000), (0, 2000)]);
        assert_eq!(straighten(&zigzag, 300.), zigzag);
    }
}
