//! Dequantization of the ten DWT subbands packed into a 4096-coefficient tile buffer.
//!
//! Each subband was scaled by its own factor at the encoder; undoing that is a per-subband
//! left shift, mirroring FreeRDP's `rfx_quantization_decode` (the subband offsets/sizes here
//! are the same RDPRFX/RDPEGFX tile layout `dwt` and `subband` already assume).

/// One shift factor per subband, in wire order: HL1, LH1, HH1, HL2, LH2, HH2, HL3, LH3, HH3, LL3.
pub(crate) type QuantFactors = [u8; 10];

const SUBBAND_OFFSETS: [(usize, usize); 10] = [
    (0, 1024),    // HL1
    (1024, 1024), // LH1
    (2048, 1024), // HH1
    (3072, 256),  // HL2
    (3328, 256),  // LH2
    (3584, 256),  // HH2
    (3840, 64),   // HL3
    (3904, 64),   // LH3
    (3968, 64),   // HH3
    (4032, 64),   // LL3
];

pub(crate) fn decode(buffer: &mut [i16], factors: &QuantFactors) {
    for (&(offset, len), &factor) in SUBBAND_OFFSETS.iter().zip(factors.iter()) {
        decode_block(&mut buffer[offset..offset + len], factor);
    }
}

fn decode_block(block: &mut [i16], factor: u8) {
    if factor < 6 {
        return;
    }
    let shift = factor - 6;
    for v in block {
        *v <<= shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_under_six_is_a_no_op() {
        let mut buffer = [1i16; 4096];
        decode(&mut buffer, &[5; 10]);
        assert!(buffer.iter().all(|&v| v == 1));
    }

    #[test]
    fn factor_shifts_every_coefficient_in_its_subband() {
        let mut buffer = [0i16; 4096];
        buffer[4032] = 3; // first LL3 coefficient
        decode(&mut buffer, &[6, 6, 6, 6, 6, 6, 6, 6, 6, 8]);
        assert_eq!(buffer[4032], 3 << 2);
    }
}
