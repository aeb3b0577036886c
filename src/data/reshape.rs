use ndarray::Axis;

use super::model::{ImageCube, SampleTable, WavelengthIndex};

// ---------------------------------------------------------------------------
// Cube → long-format table
// ---------------------------------------------------------------------------

/// Flatten the cube into one `(wavelength, value)` row per pixel per band.
///
/// Rows are band-major: every pixel of the first band (row-major pixel
/// order), then every pixel of the second band, and so on. Band `b` is
/// labelled with the wavelength the index assigns to `b`.
pub fn reshape(cube: &ImageCube, index: &WavelengthIndex) -> SampleTable {
    debug_assert_eq!(cube.bands(), index.len(), "band count mismatch");

    let pixels = cube.rows() * cube.columns();
    let mut table = SampleTable {
        wavelength: Vec::with_capacity(pixels * index.len()),
        value: Vec::with_capacity(pixels * index.len()),
        basename: cube.basename(),
    };

    for (wl, band) in index.iter() {
        let view = cube.data.index_axis(Axis(2), band);
        table.value.extend(view.iter().copied());
        table.wavelength.resize(table.value.len(), wl);
    }

    log::debug!(
        "Reshaped {}x{}x{} cube into {} rows",
        cube.rows(),
        cube.columns(),
        cube.bands(),
        table.len()
    );
    table
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;

    fn cube() -> (ImageCube, WavelengthIndex) {
        // value = 100 * band + 10 * row + col
        let data = Array3::from_shape_fn((2, 3, 3), |(r, c, b)| (100 * b + 10 * r + c) as f32);
        (
            ImageCube::new(data, "cube"),
            WavelengthIndex::new(vec![0.0, 500.0, 600.0]),
        )
    }

    #[test]
    fn row_count_is_rows_times_columns_times_bands() {
        let (cube, index) = cube();
        let table = reshape(&cube, &index);
        assert_eq!(table.len(), 2 * 3 * 3);
        assert_eq!(table.wavelength.len(), table.value.len());
    }

    #[test]
    fn rows_are_band_major_and_keep_labels() {
        let (cube, index) = cube();
        let table = reshape(&cube, &index);

        let first: Vec<(f64, f32)> = table.rows().take(6).collect();
        assert_eq!(
            first,
            vec![
                (0.0, 0.0),
                (0.0, 1.0),
                (0.0, 2.0),
                (0.0, 10.0),
                (0.0, 11.0),
                (0.0, 12.0),
            ]
        );
        assert_eq!(table.rows().nth(6), Some((500.0, 100.0)));
        assert_eq!(table.rows().last(), Some((600.0, 212.0)));
    }

    #[test]
    fn wavelengths_come_from_the_index() {
        let (cube, index) = cube();
        let table = reshape(&cube, &index);
        assert!(table.wavelength.iter().all(|&wl| index.band_of(wl).is_some()));
        assert_eq!(table.basename, "cube");
    }
}
