//! Row-major grid placement for the glass panels.

/// Places `count` objects on a grid with a fixed number of rows.
///
/// Columns are derived from the object count (`ceil(count / rows)`), objects
/// fill the grid row by row, and the column/row offsets are centred so that a
/// full grid is symmetric around the origin. Everything lives on `z = 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    pub rows: usize,
    pub spacing_x: f32,
    pub spacing_y: f32,
}

impl GridLayout {
    pub const ROWS: usize = 3;

    pub fn new(spacing_x: f32, spacing_y: f32) -> Self {
        Self {
            rows: Self::ROWS,
            spacing_x,
            spacing_y,
        }
    }

    /// Number of columns needed for `count` objects.
    pub fn columns(&self, count: usize) -> usize {
        count.div_ceil(self.rows.max(1))
    }

    /// `(row, column)` of the object at `index`.
    pub fn cell(&self, index: usize, count: usize) -> (usize, usize) {
        let columns = self.columns(count).max(1);
        (index / columns, index % columns)
    }

    pub fn position(&self, index: usize, count: usize) -> cgmath::Vector3<f32> {
        let columns = self.columns(count).max(1) as f32;
        let rows = self.rows.max(1) as f32;
        let (row, column) = self.cell(index, count);
        cgmath::Vector3::new(
            (column as f32 - (columns - 1.0) / 2.0) * self.spacing_x,
            ((rows - 1.0) / 2.0 - row as f32) * self.spacing_y,
            0.0,
        )
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(4.0, 2.6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_objects_use_two_columns() {
        let grid = GridLayout::new(4.0, 2.0);
        assert_eq!(grid.columns(4), 2);

        assert_eq!(grid.cell(0, 4), (0, 0));
        assert_eq!(grid.position(0, 4), cgmath::Vector3::new(-2.0, 2.0, 0.0));

        assert_eq!(grid.cell(3, 4), (1, 1));
        assert_eq!(grid.position(3, 4), cgmath::Vector3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn full_grid_is_centred_on_origin() {
        let grid = GridLayout::default();
        let centre = (0..9)
            .map(|i| grid.position(i, 9))
            .fold(cgmath::Vector3::new(0.0, 0.0, 0.0), |acc, p| acc + p);
        assert!(centre.x.abs() < 1e-5);
        assert!(centre.y.abs() < 1e-5);
        assert_eq!(centre.z, 0.0);
    }

    #[test]
    fn single_object_sits_in_the_top_row() {
        let grid = GridLayout::new(4.0, 2.6);
        assert_eq!(grid.columns(1), 1);
        assert_eq!(grid.position(0, 1), cgmath::Vector3::new(0.0, 2.6, 0.0));
    }

    #[test]
    fn empty_grid_has_no_columns() {
        assert_eq!(GridLayout::default().columns(0), 0);
    }

    #[test]
    fn cells_fill_rows_first() {
        let grid = GridLayout::default();
        let cells: Vec<_> = (0..7).map(|i| grid.cell(i, 7)).collect();
        assert_eq!(
            cells,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2), (2, 0)]
        );
    }
}
