use std::mem::size_of;

mod sealed {
    pub trait Sealed {}
}

/// The fixed set of numeric types that can be read and written by address.
///
/// Values travel in the platform's native byte order.
pub trait Primitive: Copy + sealed::Sealed {
    const SIZE: usize;
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default;

    fn from_ne_bytes(bytes: Self::Bytes) -> Self;
    fn to_ne_bytes(self) -> Self::Bytes;

    /// Decodes from the first [`Self::SIZE`] bytes of `source`.
    fn read_from(source: &[u8]) -> Self {
        let mut bytes = Self::Bytes::default();
        bytes.as_mut().copy_from_slice(&source[..Self::SIZE]);
        Self::from_ne_bytes(bytes)
    }

    /// Encodes into the first [`Self::SIZE`] bytes of `dest`.
    fn write_to(self, dest: &mut [u8]) {
        dest[..Self::SIZE].copy_from_slice(self.to_ne_bytes().as_ref());
    }
}

macro_rules! primitive {
    ($($t:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl Primitive for $t {
                const SIZE: usize = size_of::<$t>();
                type Bytes = [u8; size_of::<$t>()];

                #[inline]
                fn from_ne_bytes(bytes: Self::Bytes) -> Self {
                    <$t>::from_ne_bytes(bytes)
                }

                #[inline]
                fn to_ne_bytes(self) -> Self::Bytes {
                    <$t>::to_ne_bytes(self)
                }
            }
        )*
    };
}

// u16 is the 16-bit character code unit
primitive!(i8, i16, u16, i32, i64, f32, f64);
