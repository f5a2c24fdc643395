//! GRIB2 simple packing (data representation template 5.0).
//!
//! Unpacking formula: value = (R + X * 2^E) * 10^(-D)
//! where R is the reference value, X the packed integer, E the binary and
//! D the decimal scale factor.

use crate::Grib2Error;

/// Default packing precision for derived fields.
pub const DEFAULT_BITS_PER_VALUE: u8 = 16;

/// Unpack simple packed GRIB2 data.
///
/// `num_points` is the full grid size, `num_packed` the number of values
/// present in the data section. Points switched off in the bitmap are
/// returned as `NaN` and consume no packed bits.
#[allow(clippy::too_many_arguments)]
pub fn unpack_simple(
    packed_data: &[u8],
    num_points: usize,
    num_packed: usize,
    bits_per_value: u8,
    reference_value: f32,
    binary_scale_factor: i16,
    decimal_scale_factor: i16,
    bitmap: Option<&[u8]>,
) -> Result<Vec<f64>, Grib2Error> {
    let present = match bitmap {
        Some(bm) => {
            if bm.len() * 8 < num_points {
                return Err(Grib2Error::UnpackingError(format!(
                    "Bitmap covers {} points, grid has {}",
                    bm.len() * 8,
                    num_points
                )));
            }
            (0..num_points).filter(|&i| bit_is_set(bm, i)).count()
        }
        None => num_points,
    };
    if present != num_packed {
        return Err(Grib2Error::UnpackingError(format!(
            "Expected {} packed values, section 5 declares {}",
            present, num_packed
        )));
    }

    let reference = reference_value as f64;
    let binary_scale = 2.0_f64.powi(binary_scale_factor as i32);
    let decimal_scale = 10.0_f64.powi(-(decimal_scale_factor as i32));

    let mut values = Vec::with_capacity(num_points);
    let mut bit_position = 0;
    let bits_per_value = bits_per_value as usize;

    for i in 0..num_points {
        if let Some(bm) = bitmap {
            if !bit_is_set(bm, i) {
                values.push(f64::NAN);
                continue;
            }
        }

        if bits_per_value == 0 {
            // All values are the reference value
            values.push(reference * decimal_scale);
            continue;
        }

        let packed_value = extract_bits(packed_data, bit_position, bits_per_value)
            .map_err(|e| Grib2Error::UnpackingError(format!("Failed to extract bits: {}", e)))?;
        bit_position += bits_per_value;

        values.push((reference + packed_value as f64 * binary_scale) * decimal_scale);
    }

    Ok(values)
}

/// Result of simple packing a field.
#[derive(Debug, Clone)]
pub struct PackedField {
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
    /// Number of values present (and packed)
    pub num_packed: u32,
    pub data: Vec<u8>,
    /// One bit per grid point, present only when some values are missing
    pub bitmap: Option<Vec<u8>>,
}

/// Pack values with simple packing at the given precision.
///
/// Non-finite values are treated as missing and recorded in a bitmap.
pub fn pack_simple(values: &[f64], bits_per_value: u8) -> Result<PackedField, Grib2Error> {
    if bits_per_value == 0 || bits_per_value > 32 {
        return Err(Grib2Error::PackingError(format!(
            "Invalid number of bits per value: {}",
            bits_per_value
        )));
    }

    let present: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let bitmap = if present.len() == values.len() {
        None
    } else {
        let mut bm = vec![0u8; values.len().div_ceil(8)];
        for (i, v) in values.iter().enumerate() {
            if v.is_finite() {
                bm[i / 8] |= 0x80 >> (i % 8);
            }
        }
        Some(bm)
    };

    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if present.is_empty() || max == min {
        return Ok(PackedField {
            reference_value: if present.is_empty() { 0.0 } else { min as f32 },
            binary_scale_factor: 0,
            decimal_scale_factor: 0,
            bits_per_value: 0,
            num_packed: present.len() as u32,
            data: Vec::new(),
            bitmap,
        });
    }

    let reference_value = min as f32;
    let reference = reference_value as f64;
    let max_packed = ((1u64 << bits_per_value) - 1) as f64;
    let range = max - reference;
    let binary_scale_factor = (range / max_packed).log2().ceil() as i16;
    let scale = 2.0_f64.powi(-(binary_scale_factor as i32));

    let mut data = vec![0u8; (present.len() * bits_per_value as usize).div_ceil(8)];
    for (n, v) in present.iter().enumerate() {
        let packed = ((v - reference) * scale).round().clamp(0.0, max_packed) as u32;
        insert_bits(&mut data, n * bits_per_value as usize, bits_per_value as usize, packed);
    }

    Ok(PackedField {
        reference_value,
        binary_scale_factor,
        decimal_scale_factor: 0,
        bits_per_value,
        num_packed: present.len() as u32,
        data,
        bitmap,
    })
}

fn bit_is_set(bitmap: &[u8], index: usize) -> bool {
    (bitmap[index / 8] >> (7 - index % 8)) & 1 == 1
}

/// Extract bits from a byte array
/// Returns the bits as a 32-bit unsigned integer
fn extract_bits(data: &[u8], start_bit: usize, num_bits: usize) -> Result<u32, String> {
    if num_bits > 32 || num_bits == 0 {
        return Err(format!("Invalid number of bits: {}", num_bits));
    }

    let mut result = 0u32;

    for i in 0..num_bits {
        let absolute_bit = start_bit + i;
        let byte_idx = absolute_bit / 8;
        let bit_idx = 7 - (absolute_bit % 8); // MSB first

        if byte_idx >= data.len() {
            return Err("Not enough data to extract bits".to_string());
        }

        let bit = (data[byte_idx] >> bit_idx) & 1;
        result = (result << 1) | (bit as u32);
    }

    Ok(result)
}

/// Write the low `num_bits` of `value` MSB first starting at `start_bit`.
fn insert_bits(data: &mut [u8], start_bit: usize, num_bits: usize, value: u32) {
    for i in 0..num_bits {
        let bit = (value >> (num_bits - 1 - i)) & 1;
        let absolute_bit = start_bit + i;
        if bit == 1 {
            data[absolute_bit / 8] |= 0x80 >> (absolute_bit % 8);
        }
    }
}
