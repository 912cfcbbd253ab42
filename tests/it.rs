use dma_rs::{Address, Dma, DmaError, SandboxMemory};
use std::{cmp::Ordering, sync::Arc};

fn native() -> Dma {
    Dma::native().expect("C runtime allocator should be available")
}

#[test]
fn fill_then_peek_native() {
    let dma = native();
    let base = dma.allocate(16).unwrap();
    assert!(!base.is_null());

    unsafe {
        dma.fill(base, 0xFF, 16);
        assert_eq!(dma.peek(base + 8), 0xFF);
        assert_eq!(dma.read_bytes(base, 16), vec![0xFF; 16]);
        dma.release(base);
    }
}

#[test]
fn equal_fills_compare_equal() {
    let dma = native();
    let a = dma.allocate(64).unwrap();
    let b = dma.allocate(64).unwrap();

    unsafe {
        dma.fill(a, 0x5A, 64);
        dma.fill(b, 0x5A, 64);
        assert_eq!(dma.compare(a, b, 64), Ordering::Equal);

        dma.poke(b + 63, 0x5B);
        assert_eq!(dma.compare(a, b, 64), Ordering::Less);
        assert_eq!(dma.compare_sign(b, a, 64), 1);

        dma.release(a);
        dma.release(b);
    }
}

#[test]
fn typed_values_native() {
    let dma = native();
    let base = dma.allocate(32).unwrap();

    unsafe {
        dma.write_i64(base + 1, i64::MIN + 3);
        assert_eq!(dma.read_i64(base + 1), i64::MIN + 3);

        dma.write_f64(base + 9, std::f64::consts::PI);
        assert_eq!(dma.read_f64(base + 9), std::f64::consts::PI);

        dma.write_char(base + 17, 'é' as u16);
        assert_eq!(dma.read_char(base + 17), 'é' as u16);

        dma.release(base);
    }
}

#[test]
fn copy_between_regions() {
    let dma = native();
    let src = dma.allocate(8).unwrap();
    let dest = dma.allocate(8).unwrap();

    unsafe {
        for i in 0..8u64 {
            dma.poke(src + i, i as u8 * 3);
        }
        dma.copy(dest, src, 8);
        assert_eq!(dma.read_bytes(dest, 8), vec![0, 3, 6, 9, 12, 15, 18, 21]);
        dma.release(src);
        dma.release(dest);
    }
}

#[test]
fn native_capability_is_shared() {
    let first = native();
    let second = native();
    assert!(std::ptr::eq(first.memory(), second.memory()));
}

#[test]
fn sandbox_is_substitutable() {
    let memory = Arc::new(SandboxMemory::with_capacity(64));
    let dma = Dma::new(memory.clone());

    let a = dma.allocate(48).unwrap();
    assert_eq!(
        dma.allocate(48),
        Err(DmaError::OutOfMemory { size: 48 })
    );

    unsafe {
        dma.write_i32(a, 0x0102_0304);
        assert_eq!(dma.read_bytes(a, 4), 0x0102_0304i32.to_ne_bytes().to_vec());
        dma.release(a);
    }
    assert_eq!(memory.live_regions(), 0);
    assert_eq!(dma.allocate(0), Ok(Address::NULL));
}

#[cfg(feature = "managed")]
mod managed {
    use dma_rs::{
        bridge::Bridge,
        introspect::{shallow_size, Introspector},
        types::TypeBuilder,
        value::{layout::Scalar, ObjectRef},
    };
    use gc_arena::{Arena, Rootable};

    #[test]
    fn measure_and_bridge_an_object() {
        let shape = TypeBuilder::new("Shape")
            .field("id", Scalar::Int32)
            .build();
        let circle = TypeBuilder::new("Circle")
            .extends(&shape)
            .field("radius", Scalar::Float64)
            .field("label", Scalar::ObjectRef)
            .static_field("count", Scalar::Int64)
            .build();

        let bridge = Bridge::native().unwrap();
        let provider = Introspector::default();
        let arena = Arena::<Rootable![()]>::new(|_mc| ());

        arena.mutate(|gc, _root| {
            let obj = ObjectRef::new_object(gc, &circle).unwrap();
            obj.as_object_mut(gc, |o| {
                o.set_field("id", 9i32);
                o.set_field("radius", 1.5f64);
            });

            let size = shallow_size(&provider, obj).unwrap();
            assert_eq!(size % 8, 0);
            assert!(size as usize > obj.as_object(|o| o.field_layout("radius").position));

            let address = bridge.address_of(gc, obj);
            let same = unsafe { bridge.object_at(gc, address) };
            assert_eq!(same, obj);
            assert_eq!(same.as_object(|o| o.get_field::<i32>("id")), 9);

            // the object's storage is reachable through raw access too
            let storage = obj.as_object(|o| dma_rs::Address::from_ptr(o.instance_storage.as_ptr()));
            let radius_at = obj.as_object(|o| o.field_layout("radius").position) as u64;
            let radius = unsafe { bridge.dma().read_f64(storage + radius_at) };
            assert_eq!(radius, 1.5);
        });
    }
}
