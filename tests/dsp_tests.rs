//! Signal chain tests: decimator, DC blocker, Goertzel, smoother

use acoustic_tone_detector::dsp::{
    bits_to_shift, coefficient, DcBlocker, Decimator, Goertzel, PowerSmoother,
};

fn sine(freq: f64, amplitude: f64, rate: f64, len: usize) -> Vec<i16> {
    (0..len)
        .map(|n| (amplitude * (2.0 * std::f64::consts::PI * freq * n as f64 / rate).sin()) as i16)
        .collect()
}

#[test]
fn test_shift_keeps_sums_in_range() {
    for &(oversample, divider) in &[(1u8, 8u8), (1, 32), (4, 64), (16, 255), (255, 255)] {
        let shift = bits_to_shift(oversample, divider);
        let product = oversample as u32 * divider as u32;
        assert!(product >> shift <= 16, "{}x{} >> {}", oversample, divider, shift);
        if shift > 0 {
            assert!(product >> (shift - 1) > 16, "shift {} not minimal", shift);
        }
    }
}

#[test]
fn test_constant_block_decimates_to_shifted_sum() {
    let values = [i16::MIN, -1, 0, 1, i16::MAX];
    let mut checked = 0;

    for divider in (1..=128usize).filter(|d| 1024 % d == 0) {
        for &oversample in &[1u8, 2, 4, 16] {
            let d = Decimator::new(divider, bits_to_shift(oversample, divider as u8));
            assert_eq!(d.divider(), divider);

            for &v in &values {
                let block = [v; 1024];
                let expected = (divider as i32 * v as i32) >> d.shift();

                let out: Vec<i32> = d.decimate(&block).collect();
                assert_eq!(out.len(), 1024 / divider);
                assert!(
                    out.iter().all(|&s| s == expected),
                    "d={} os={} v={}",
                    divider,
                    oversample,
                    v
                );
                checked += 1;
            }
        }
    }

    assert_eq!(checked, 8 * 4 * 5);
}

#[test]
fn test_negative_sums_shift_toward_negative_infinity() {
    let d = Decimator::new(32, bits_to_shift(1, 32));
    assert_eq!(d.shift(), 1);
    // Sum is -31; the arithmetic shift rounds it down to -16
    let mut group = [-1i16; 32];
    group[0] = 0;
    assert_eq!(d.reduce(&group), -16);
}

#[test]
fn test_decimated_full_scale_fits_after_shift() {
    let d = Decimator::new(64, bits_to_shift(1, 64));
    let block = [i16::MAX; 64];
    let v = d.reduce(&block);
    assert!(v <= 16 * i16::MAX as i32);
    assert_eq!(v, (64 * i16::MAX as i32) >> 2);
}

#[test]
fn test_decimate_then_block_constant() {
    let d = Decimator::new(8, 0);
    let mut dc = DcBlocker::new();
    let block = [250i16; 1024];

    let out: Vec<i16> = d.decimate(&block).map(|s| dc.process_i16(s)).collect();
    assert_eq!(out.len(), 128);
    assert_eq!(out[0], 2000);
    // Monotone decay toward zero
    assert!(out.windows(2).all(|w| w[1] <= w[0]));
    assert!(out[127] < out[0]);
}

#[test]
fn test_dc_blocker_state_carries_across_blocks() {
    let d = Decimator::new(8, 0);
    let block = [250i16; 1024];

    let mut split = DcBlocker::new();
    for _ in 0..4 {
        for s in d.decimate(&block) {
            split.process(s);
        }
    }

    let mut joined = DcBlocker::new();
    let long = [250i16; 4096];
    for s in d.decimate(&long) {
        joined.process(s);
    }

    assert_eq!(split, joined);
}

#[test]
fn test_dc_blocker_removes_offset_keeps_tone() {
    let mut dc = DcBlocker::new();
    let tone = sine(8000.0, 4000.0, 48_000.0, 2048);

    let out: Vec<i16> = tone.iter().map(|&s| dc.process_i16(s as i32 + 3000)).collect();

    let tail = &out[1024..];
    let mean = tail.iter().map(|&s| s as i64).sum::<i64>() / tail.len() as i64;
    let peak = tail.iter().map(|&s| (s as i32).abs()).max().unwrap();
    assert!(mean.abs() < 50, "mean = {}", mean);
    assert!(peak > 3000, "peak = {}", peak);
}

#[test]
fn test_goertzel_peak_is_at_coefficient_resonance() {
    let coeff = coefficient(1400.0, 48_000.0);
    let mut g = Goertzel::new(coeff);
    assert_eq!(g.coeff(), coeff);

    let at_peak = g.block_power(sine(8073.0, 16000.0, 48_000.0, 128));
    assert!(at_peak > 900.0 && at_peak < 1050.0, "peak = {}", at_peak);

    for &freq in &[1400.0, 4000.0, 12_000.0, 20_000.0] {
        let p = g.block_power(sine(freq, 16000.0, 48_000.0, 128));
        assert!(p < 2.0, "{} Hz power = {}", freq, p);
        assert!(p < at_peak / 100.0);
    }

    let dc = g.block_power(vec![16000i16; 128]);
    assert!(dc < at_peak / 100.0, "dc power = {}", dc);
}

#[test]
fn test_goertzel_target_tone_power() {
    let mut g = Goertzel::new(coefficient(1400.0, 48_000.0));
    let p = g.block_power(sine(1400.0, 16000.0, 48_000.0, 128));
    assert!((p - 0.2745).abs() < 1e-3, "power = {}", p);
}

#[test]
fn test_goertzel_blocks_are_independent() {
    let mut g = Goertzel::new(coefficient(1400.0, 48_000.0));
    let tone = sine(8073.0, 16000.0, 48_000.0, 128);

    let first = g.block_power(tone.iter().copied());
    let _ = g.block_power(vec![i16::MAX; 128]);
    let again = g.block_power(tone.iter().copied());
    assert_eq!(first, again);
}

#[test]
fn test_smoother_converges_to_steady_power() {
    let mut s = PowerSmoother::new(0.1, 5.0);
    assert_eq!(s.threshold(), 5.0);
    let mut last = (0.0, false);
    for _ in 0..200 {
        last = s.decide(10.0);
    }
    assert!((last.0 - 10.0).abs() < 1e-3);
    assert!(last.1);

    for _ in 0..200 {
        last = s.decide(0.0);
    }
    assert!(last.0 < 1e-3);
    assert!(!last.1);
}
