#[cfg(test)]
mod tests {
    use crate::{
        types::{TypeBuilder, TypeDescription},
        value::{layout::Scalar, ObjectRef},
    };
    use gc_arena::{Arena, Rootable};

    type TestRoot = Rootable![()];

    #[test]
    fn test_read_null() {
        let arena = Arena::<TestRoot>::new(|_mc| ());

        arena.mutate(|_gc, _root| {
            let null_bytes = 0usize.to_ne_bytes();
            let obj = unsafe { ObjectRef::read(&null_bytes) };
            assert!(obj.is_null());
            assert_eq!(obj, ObjectRef::NULL);
            assert_eq!(format!("{:?}", obj), "NULL");
        });
    }

    #[test]
    fn test_write_then_read_is_same_handle() {
        let td = TypeBuilder::new("Node").build();
        let arena = Arena::<TestRoot>::new(|_mc| ());

        arena.mutate(|gc, _root| {
            let obj = ObjectRef::new_object(gc, &td).unwrap();
            let mut slot = [0u8; std::mem::size_of::<usize>()];
            obj.write(&mut slot);
            let back = unsafe { ObjectRef::read(&slot) };
            assert_eq!(back, obj);
            assert_eq!(back.as_ptr(), obj.as_ptr());
        });
    }

    #[test]
    fn test_primitive_fields() {
        let td = TypeBuilder::new("Sample")
            .field("flag", Scalar::Int8)
            .field("count", Scalar::Int32)
            .field("ratio", Scalar::Float64)
            .build();
        let arena = Arena::<TestRoot>::new(|_mc| ());

        arena.mutate(|gc, _root| {
            let obj = ObjectRef::new_object(gc, &td).unwrap();
            assert_eq!(obj.as_object(|o| o.get_field::<i32>("count")), 0);

            obj.as_object_mut(gc, |o| {
                o.set_field("flag", -1i8);
                o.set_field("count", 42i32);
                o.set_field("ratio", 0.5f64);
            });

            obj.as_object(|o| {
                assert_eq!(o.get_field::<i8>("flag"), -1);
                assert_eq!(o.get_field::<i32>("count"), 42);
                assert_eq!(o.get_field::<f64>("ratio"), 0.5);
            });
        });
    }

    #[test]
    fn test_inherited_field_access() {
        let base = TypeBuilder::new("Base").field("id", Scalar::Int64).build();
        let derived = TypeBuilder::new("Derived")
            .extends(&base)
            .field("extra", Scalar::Int16)
            .build();
        let arena = Arena::<TestRoot>::new(|_mc| ());

        arena.mutate(|gc, _root| {
            let obj = ObjectRef::new_object(gc, &derived).unwrap();
            obj.as_object_mut(gc, |o| {
                o.set_field("id", 7i64);
                o.set_field("extra", 3i16);
            });
            obj.as_object(|o| {
                assert_eq!(o.get_field::<i64>("id"), 7);
                assert_eq!(o.get_field::<i16>("extra"), 3);
                assert_eq!(o.size_bytes(), 16);
            });
            assert_eq!(obj.type_description(), Some(derived.clone()));
        });
    }

    #[test]
    fn test_reference_fields() {
        let td = TypeBuilder::new("Link")
            .field("next", Scalar::ObjectRef)
            .build();
        let arena = Arena::<TestRoot>::new(|_mc| ());

        arena.mutate(|gc, _root| {
            let head = ObjectRef::new_object(gc, &td).unwrap();
            let tail = ObjectRef::new_object(gc, &td).unwrap();
            assert!(head.as_object(|o| o.get_ref_field("next")).is_null());

            head.as_object_mut(gc, |o| o.set_ref_field("next", tail));
            assert_eq!(head.as_object(|o| o.get_ref_field("next")), tail);
            assert_ne!(head, tail);
        });
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn test_missing_field_panics() {
        let td = TypeBuilder::new("Empty").build();
        let arena = Arena::<TestRoot>::new(|_mc| ());

        arena.mutate(|gc, _root| {
            let obj = ObjectRef::new_object(gc, &td).unwrap();
            obj.as_object(|o| o.get_field::<i32>("nope"));
        });
    }

    #[test]
    fn test_vector_elements() {
        let arena = Arena::<TestRoot>::new(|_mc| ());

        arena.mutate(|gc, _root| {
            let ints = ObjectRef::new_vector(gc, Scalar::Int32, 4);
            ints.as_vector_mut(gc, |v| v.set_element(2, 99i32));
            ints.as_vector(|v| {
                assert_eq!(v.len(), 4);
                assert_eq!(v.size_bytes(), 16);
                assert_eq!(v.get_element::<i32>(2), 99);
                assert_eq!(v.get_element::<i32>(3), 0);
            });

            let refs = ObjectRef::new_vector(gc, Scalar::ObjectRef, 1);
            assert!(refs.as_vector(|v| v.get_ref(0)).is_null());
            refs.as_vector_mut(gc, |v| v.set_ref(0, ints));
            assert_eq!(refs.as_vector(|v| v.get_ref(0)), ints);
        });
    }

    #[test]
    fn test_vector_reports_root_type() {
        let arena = Arena::<TestRoot>::new(|_mc| ());

        arena.mutate(|gc, _root| {
            let v = ObjectRef::new_vector(gc, Scalar::UInt8, 3);
            assert_eq!(v.type_description(), Some(TypeDescription::object()));
            assert_eq!(ObjectRef::NULL.type_description(), None);
        });
    }

    #[test]
    fn test_referenced_objects_survive_collection() {
        type VecRoot = Rootable![ObjectRef<'_>];

        let td = TypeBuilder::new("Payload")
            .field("value", Scalar::Int32)
            .build();
        let mut arena = Arena::<VecRoot>::new(|gc| {
            let holder = ObjectRef::new_vector(gc, Scalar::ObjectRef, 1);
            let payload = ObjectRef::new_object(gc, &td).unwrap();
            payload.as_object_mut(gc, |o| o.set_field("value", 1234i32));
            holder.as_vector_mut(gc, |v| v.set_ref(0, payload));
            holder
        });

        arena.collect_all();

        arena.mutate(|_gc, root| {
            let payload = root.as_vector(|v| v.get_ref(0));
            assert_eq!(payload.as_object(|o| o.get_field::<i32>("value")), 1234);
        });
    }
}
