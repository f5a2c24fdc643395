//! Test data generators for creating synthetic surface fields.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite. All grids are row-major
//! (row 0 first) with `width * height` values.

/// Creates a grid where each cell is `col * 1000 + row`.
///
/// ```
/// use test_utils::index_grid;
///
/// let grid = index_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn index_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Creates a 2m temperature grid in Kelvin.
///
/// Values range from 280K to 310K, colder to the top-left.
pub fn temperature_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f64 / width.max(1) as f64;
            let y_factor = row as f64 / height.max(1) as f64;
            data.push(280.0 + x_factor * 15.0 + y_factor * 15.0);
        }
    }
    data
}

/// Creates a dewpoint grid a fixed depression below `temperature_grid`.
pub fn dewpoint_grid(width: usize, height: usize, depression: f64) -> Vec<f64> {
    temperature_grid(width, height)
        .into_iter()
        .map(|t| t - depression)
        .collect()
}

/// Creates a U-component wind grid (west-east) in m/s, varying by row.
pub fn u_wind_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let lat_factor = (row as f64 / height.max(1) as f64 - 0.5) * 2.0; // -1 to 1
        for _col in 0..width {
            data.push(lat_factor * 8.0);
        }
    }
    data
}

/// Creates a V-component wind grid (south-north) in m/s, varying by column.
pub fn v_wind_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let lon_factor = (col as f64 / width.max(1) as f64 - 0.5) * 2.0;
            data.push(lon_factor * 6.0);
        }
    }
    data
}

/// Creates an accumulated flux grid in J m-2.
///
/// `mean_rate` is the mean flux in W m-2 over `step_hours`; each cell is
/// perturbed deterministically by up to 10% so grids are not constant.
pub fn accumulated_flux_grid(width: usize, height: usize, mean_rate: f64, step_hours: u32) -> Vec<f64> {
    let seconds = step_hours as f64 * 3600.0;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let jitter = (simple_hash(col as u32, row as u32, 7) % 1000) as f64 / 10_000.0;
            data.push(mean_rate * (1.0 + jitter) * seconds);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h
}

/// Latitudes and longitudes of a regular grid scanning north to south.
pub fn lat_lon_grid(
    width: usize,
    height: usize,
    north: f64,
    west: f64,
    increment: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut lats = Vec::with_capacity(width * height);
    let mut lons = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            lats.push(north - row as f64 * increment);
            lons.push(west + col as f64 * increment);
        }
    }
    (lats, lons)
}
