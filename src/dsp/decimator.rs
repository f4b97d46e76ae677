//! Integer decimator: unweighted sum of each group of raw samples.

/// Decimated sums are kept within this multiple of one sample's range.
const MAX_UNSHIFTED_OVERSAMPLING: u16 = 16;

/// Smallest shift `k` with `(oversample_rate * divider) >> k <= 16`.
pub fn bits_to_shift(oversample_rate: u8, divider: u8) -> u8 {
    let mut oversampling = oversample_rate as u16 * divider as u16;
    let mut bits = 0;

    while oversampling > MAX_UNSHIFTED_OVERSAMPLING {
        oversampling >>= 1;
        bits += 1;
    }

    bits
}

/// Sums `divider` consecutive raw samples into one decimated sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decimator {
    divider: usize,
    shift: u8,
}

impl Decimator {
    /// `divider` must be non-zero and divide every block passed to
    /// [`Decimator::decimate`]; session start guarantees both.
    pub fn new(divider: usize, shift: u8) -> Self {
        Self { divider, shift }
    }

    #[inline]
    pub fn divider(&self) -> usize {
        self.divider
    }

    #[inline]
    pub fn shift(&self) -> u8 {
        self.shift
    }

    /// Sum one group and apply the shift. The shift is arithmetic, so
    /// negative sums round toward negative infinity.
    #[inline]
    pub fn reduce(&self, group: &[i16]) -> i32 {
        let sum: i32 = group.iter().map(|&s| s as i32).sum();
        sum >> self.shift
    }

    /// Decimated samples of `block`, in order.
    #[inline]
    pub fn decimate<'b>(&self, block: &'b [i16]) -> impl Iterator<Item = i32> + 'b {
        debug_assert!(block.len() % self.divider == 0, "divider must divide block");
        let this = *self;
        block.chunks_exact(self.divider).map(move |group| this.reduce(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_to_shift() {
        assert_eq!(bits_to_shift(1, 8), 0);
        assert_eq!(bits_to_shift(1, 16), 0);
        assert_eq!(bits_to_shift(1, 17), 1);
        assert_eq!(bits_to_shift(2, 16), 1);
        assert_eq!(bits_to_shift(1, 48), 2);
        assert_eq!(bits_to_shift(4, 64), 4);
        assert_eq!(bits_to_shift(255, 255), 12);
    }

    #[test]
    fn test_reduce_sums_group() {
        let d = Decimator::new(4, 0);
        assert_eq!(d.reduce(&[1, 2, 3, 4]), 10);
        assert_eq!(d.reduce(&[i16::MAX; 4]), 4 * i16::MAX as i32);
    }

    #[test]
    fn test_shift_truncates() {
        let d = Decimator::new(2, 1);
        assert_eq!(d.reduce(&[3, 2]), 2);
        assert_eq!(d.reduce(&[-3, -2]), -3);
    }

    #[test]
    fn test_decimate_length_and_order() {
        let block: [i16; 8] = [1, 1, 2, 2, 3, 3, 4, 4];
        let d = Decimator::new(2, 0);
        let mut out = [0i32; 4];
        for (o, s) in out.iter_mut().zip(d.decimate(&block)) {
            *o = s;
        }
        assert_eq!(out, [2, 4, 6, 8]);
        assert_eq!(d.decimate(&block).count(), 4);
    }
}
