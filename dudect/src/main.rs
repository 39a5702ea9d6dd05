use dudect_bencher::{ctbench_main, BenchRng, Class, CtRunner};
use subtle::ConstantTimeEq;

// Container decryption (`container::decrypt_file`, see src/container.rs) accepts
// the recovered plaintext only after comparing the recomputed HMAC against the
// one stored in the container via `subtle::ConstantTimeEq`, never a `==` that
// could short-circuit on the first differing byte. This harness exercises that
// same comparison in isolation -- the only way a dudect bench can usefully
// target it, since routing through the full `decrypt_file` path would have
// 10,000 PBKDF2 iterations and file I/O swamp the signal.

const MAC_LEN: usize = 64; // matches container::HMAC_SIZE

/// `Class::Left` mismatches the stored MAC at byte 0 (the earliest possible
/// divergence); `Class::Right` mismatches only at byte 63 (the latest). A
/// non-constant-time comparison (e.g. one that returns as soon as it finds a
/// difference) would make `Left` measurably faster than `Right`; `ct_eq`
/// should show no such split.
fn mac_compare(runner: &mut CtRunner, _rng: &mut BenchRng) {
    const ITERATIONS: usize = 100_000;

    let stored = [0xa5u8; MAC_LEN];

    let mut classes = [Class::Right; ITERATIONS];
    for (i, class) in classes.iter_mut().enumerate() {
        if i % 2 == 0 {
            *class = Class::Left;
        }
    }

    for class in classes {
        let mut candidate = stored;
        match class {
            Class::Left => candidate[0] ^= 0xff,
            Class::Right => candidate[MAC_LEN - 1] ^= 0xff,
        }
        runner.run_one(class, || {
            let _ = candidate.ct_eq(&stored);
        });
    }
}

ctbench_main!(mac_compare);
