//! Fixed sampling lattice over the physical domain.
//!
//! A [`Domain`] holds two ascending coordinate axes spanning `[0, width]` and
//! `[0, height]`. Their cross product is the lattice every [`Field`] in the
//! system is evaluated on. Point queries resolve to the nearest lattice cell
//! per axis with no interpolation; queries outside the extent resolve to the
//! boundary cell.

use glam::DVec2;

use crate::error::SimError;
use crate::field::Field;

/// `n` evenly spaced values from `start` to `stop` inclusive.
///
/// A single sample yields `[start]`; zero samples yield an empty vector.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Index of the coordinate closest to `value` in an ascending axis.
///
/// Ties resolve to the lower index. Values beyond either end (including
/// infinities) resolve to the end cell; NaN resolves to index 0.
pub fn nearest_index(axis: &[f64], value: f64) -> usize {
    let upper = axis.partition_point(|&c| c < value);
    if upper == 0 {
        return 0;
    }
    if upper == axis.len() {
        return axis.len() - 1;
    }
    if value - axis[upper - 1] <= axis[upper] - value {
        upper - 1
    } else {
        upper
    }
}

/// Immutable sampling lattice shared by the generator and the estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    extent: DVec2,
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Domain {
    /// Builds a `resolution × resolution` lattice over `[0, width] × [0, height]`.
    pub fn new(width: f64, height: f64, resolution: usize) -> Result<Self, SimError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(SimError::InvalidDomain { width, height });
        }
        if resolution == 0 {
            return Err(SimError::InvalidDimensions);
        }
        Ok(Self {
            extent: DVec2::new(width, height),
            xs: linspace(0.0, width, resolution),
            ys: linspace(0.0, height, resolution),
        })
    }

    /// Physical size of the domain.
    pub fn extent(&self) -> DVec2 {
        self.extent
    }

    /// Centre of the domain.
    pub fn midpoint(&self) -> DVec2 {
        self.extent * 0.5
    }

    /// x coordinates of the lattice columns.
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// y coordinates of the lattice rows.
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Distance between neighbouring lattice coordinates on each axis.
    ///
    /// Nearest-cell lookup is off by at most half of this per axis for
    /// points inside the extent.
    pub fn spacing(&self) -> DVec2 {
        let step = |axis: &[f64], size: f64| {
            if axis.len() > 1 {
                size / (axis.len() - 1) as f64
            } else {
                size
            }
        };
        DVec2::new(step(&self.xs, self.extent.x), step(&self.ys, self.extent.y))
    }

    /// Evaluates `f(x, y)` at every lattice point.
    pub fn map(&self, mut f: impl FnMut(f64, f64) -> f64) -> Field {
        let data = self
            .ys
            .iter()
            .flat_map(|&y| self.xs.iter().map(move |&x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Field::from_raw(self.xs.len(), self.ys.len(), data)
    }

    /// Zero field shaped like this lattice.
    pub fn zero_field(&self) -> Field {
        self.map(|_, _| 0.0)
    }

    /// `(col, row)` of the lattice cell nearest to `position`, chosen
    /// independently per axis. Out-of-extent positions clamp to the boundary.
    pub fn nearest_cell(&self, position: DVec2) -> (usize, usize) {
        (
            nearest_index(&self.xs, position.x),
            nearest_index(&self.ys, position.y),
        )
    }

    /// Reads `field` at the cell nearest to `position`.
    pub fn lookup(&self, field: &Field, position: DVec2) -> f64 {
        let (col, row) = self.nearest_cell(position);
        field.get(col, row)
    }

    /// Coarse `n × n` lattice of points spanning the domain, x-major
    /// (all y values for the first x, then the next x).
    pub fn coarse_lattice(&self, n: usize) -> Vec<DVec2> {
        let xs = linspace(0.0, self.extent.x, n);
        let ys = linspace(0.0, self.extent.y, n);
        xs.iter()
            .flat_map(|&x| ys.iter().map(move |&y| DVec2::new(x, y)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_domain() -> Domain {
        Domain::new(100.0, 100.0, 100).unwrap()
    }

    #[test]
    fn linspace_matches_inclusive_endpoints() {
        let v = linspace(0.0, 100.0, 5);
        assert_eq!(v, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn new_rejects_bad_extent() {
        assert!(matches!(
            Domain::new(0.0, 10.0, 10),
            Err(SimError::InvalidDomain { .. })
        ));
        assert!(Domain::new(10.0, f64::NAN, 10).is_err());
        assert!(Domain::new(10.0, -1.0, 10).is_err());
    }

    #[test]
    fn new_rejects_zero_resolution() {
        assert!(matches!(
            Domain::new(10.0, 10.0, 0),
            Err(SimError::InvalidDimensions)
        ));
    }

    #[test]
    fn spacing_is_extent_over_intervals() {
        let d = unit_domain();
        let s = d.spacing();
        assert!((s.x - 100.0 / 99.0).abs() < 1e-12);
        assert!((s.y - 100.0 / 99.0).abs() < 1e-12);
    }

    #[test]
    fn exact_grid_coordinate_resolves_to_that_cell() {
        let d = unit_domain();
        let p = DVec2::new(d.xs()[37], d.ys()[81]);
        assert_eq!(d.nearest_cell(p), (37, 81));
    }

    #[test]
    fn ties_resolve_to_lower_index() {
        let axis = [0.0, 1.0, 2.0];
        assert_eq!(nearest_index(&axis, 0.5), 0);
        assert_eq!(nearest_index(&axis, 1.5), 1);
        assert_eq!(nearest_index(&axis, 1.6), 2);
    }

    #[test]
    fn out_of_domain_clamps_to_boundary_cell() {
        let d = unit_domain();
        assert_eq!(d.nearest_cell(DVec2::new(-50.0, 250.0)), (0, 99));
        assert_eq!(d.nearest_cell(DVec2::new(1e9, -1e9)), (99, 0));
        assert_eq!(
            d.nearest_cell(DVec2::new(f64::INFINITY, f64::NEG_INFINITY)),
            (99, 0)
        );
    }

    #[test]
    fn nan_position_resolves_to_origin_cell() {
        let d = unit_domain();
        assert_eq!(d.nearest_cell(DVec2::new(f64::NAN, f64::NAN)), (0, 0));
    }

    #[test]
    fn map_evaluates_row_major() {
        let d = Domain::new(2.0, 4.0, 3).unwrap();
        let f = d.map(|x, y| x + 10.0 * y);
        // row 1 is y = 2, col 2 is x = 2
        assert!((f.get(2, 1) - 22.0).abs() < 1e-12);
    }

    #[test]
    fn lookup_reads_nearest_cell() {
        let d = Domain::new(10.0, 10.0, 11).unwrap();
        let f = d.map(|x, y| x * 100.0 + y);
        assert!((d.lookup(&f, DVec2::new(3.2, 6.9)) - 307.0).abs() < 1e-9);
    }

    #[test]
    fn coarse_lattice_is_x_major() {
        let d = unit_domain();
        let pts = d.coarse_lattice(20);
        assert_eq!(pts.len(), 400);
        assert_eq!(pts[0], DVec2::new(0.0, 0.0));
        assert!((pts[1].y - 100.0 / 19.0).abs() < 1e-12);
        assert_eq!(pts[1].x, 0.0);
        assert_eq!(pts[399], DVec2::new(100.0, 100.0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn in_extent_error_bounded_by_half_spacing(
                x in 0.0_f64..=100.0,
                y in 0.0_f64..=100.0,
            ) {
                let d = unit_domain();
                let (col, row) = d.nearest_cell(DVec2::new(x, y));
                let half = d.spacing() * 0.5;
                prop_assert!((d.xs()[col] - x).abs() <= half.x + 1e-9);
                prop_assert!((d.ys()[row] - y).abs() <= half.y + 1e-9);
            }

            #[test]
            fn any_position_resolves_inside_lattice(
                x in prop::num::f64::ANY,
                y in prop::num::f64::ANY,
            ) {
                let d = Domain::new(50.0, 20.0, 17).unwrap();
                let (col, row) = d.nearest_cell(DVec2::new(x, y));
                prop_assert!(col < 17 && row < 17);
            }
        }
    }
}
