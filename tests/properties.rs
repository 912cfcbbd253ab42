//! Property tests for raw access, run against the sandbox capability.

use dma_rs::{Dma, SandboxMemory};
use proptest::prelude::*;
use std::{cmp::Ordering, sync::Arc};

fn sandbox() -> Dma<SandboxMemory> {
    Dma::new(Arc::new(SandboxMemory::new()))
}

fn region(dma: &Dma<SandboxMemory>, bytes: &[u8]) -> dma_rs::Address {
    let base = dma.allocate(bytes.len().max(1) as u64).unwrap();
    for (i, b) in bytes.iter().enumerate() {
        unsafe { dma.poke(base + i as u64, *b) };
    }
    base
}

proptest! {
    /// fill then read_bytes gives n copies of the value
    #[test]
    fn fill_then_read(n in 0usize..256, value in any::<u8>()) {
        let dma = sandbox();
        let base = dma.allocate(n.max(1) as u64).unwrap();
        let bytes = unsafe {
            dma.fill(base, value, n);
            dma.read_bytes(base, n)
        };
        prop_assert_eq!(bytes, vec![value; n]);
    }

    /// copy then compare is equal
    #[test]
    fn copy_then_compare(data in prop::collection::vec(any::<u8>(), 1..128)) {
        let dma = sandbox();
        let src = region(&dma, &data);
        let dest = dma.allocate(data.len() as u64).unwrap();
        unsafe {
            dma.copy(dest, src, data.len());
            prop_assert_eq!(dma.compare(dest, src, data.len()), Ordering::Equal);
            prop_assert_eq!(dma.read_bytes(dest, data.len()), data);
        }
    }

    /// compare(a, b) is the reverse of compare(b, a)
    #[test]
    fn compare_antisymmetric(
        a in prop::collection::vec(any::<u8>(), 16),
        b in prop::collection::vec(any::<u8>(), 16),
    ) {
        let dma = sandbox();
        let (x, y) = (region(&dma, &a), region(&dma, &b));
        unsafe {
            prop_assert_eq!(dma.compare(x, y, 16), dma.compare(y, x, 16).reverse());
            prop_assert_eq!(dma.compare_sign(x, y, 16), -dma.compare_sign(y, x, 16));
        }
    }

    /// the first differing byte alone decides the order, as a signed byte
    #[test]
    fn first_difference_decides(
        prefix in prop::collection::vec(any::<u8>(), 0..32),
        left in any::<i8>(),
        right in any::<i8>(),
        tail_a in prop::collection::vec(any::<u8>(), 8),
        tail_b in prop::collection::vec(any::<u8>(), 8),
    ) {
        prop_assume!(left != right);
        let mut a = prefix.clone();
        a.push(left as u8);
        a.extend(&tail_a);
        let mut b = prefix;
        b.push(right as u8);
        b.extend(&tail_b);

        let dma = sandbox();
        let (x, y) = (region(&dma, &a), region(&dma, &b));
        let order = unsafe { dma.compare(x, y, a.len()) };
        prop_assert_eq!(order, left.cmp(&right));
    }

    /// every typed accessor round trips at every offset in a region
    #[test]
    fn typed_round_trip_any_offset(
        offset in 0u64..24,
        b in any::<i8>(),
        s in any::<i16>(),
        c in any::<u16>(),
        i in any::<i32>(),
        l in any::<i64>(),
        f in any::<f32>().prop_filter("not NaN", |f| !f.is_nan()),
        d in any::<f64>().prop_filter("not NaN", |d| !d.is_nan()),
    ) {
        let dma = sandbox();
        let base = dma.allocate(32).unwrap();
        let at = base + offset;
        unsafe {
            dma.write_i8(at, b);
            prop_assert_eq!(dma.read_i8(at), b);
            dma.write_i16(at, s);
            prop_assert_eq!(dma.read_i16(at), s);
            dma.write_char(at, c);
            prop_assert_eq!(dma.read_char(at), c);
            dma.write_i32(at, i);
            prop_assert_eq!(dma.read_i32(at), i);
            dma.write_i64(at, l);
            prop_assert_eq!(dma.read_i64(at), l);
            dma.write_f32(at, f);
            prop_assert_eq!(dma.read_f32(at), f);
            dma.write_f64(at, d);
            prop_assert_eq!(dma.read_f64(at), d);
        }
    }
}

#[cfg(feature = "managed")]
proptest! {
    /// shallow size is the next word boundary strictly above the largest offset
    #[test]
    fn padded_size_bounds(max_offset in 0u64..1 << 40) {
        let size = dma_rs::introspect::padded_size(max_offset);
        prop_assert_eq!(size % 8, 0);
        prop_assert!(size > max_offset);
        prop_assert!(size <= max_offset + 8);
    }
}
