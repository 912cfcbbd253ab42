use sptr::Strict;
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::{Add, AddAssign, Sub, SubAssign},
};

/// A raw memory location, either in unmanaged memory or in the managed heap.
///
/// Carries no length, type or ownership. Arithmetic wraps, since an address is
/// only ever meaningful to whoever handed it out.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Address(pub u64);

impl Address {
    pub const NULL: Self = Address(0);

    pub const fn new(address: u64) -> Self {
        Address(address)
    }

    /// Zero-extends the bit pattern of a 32-bit value.
    pub const fn from_i32_bits(value: i32) -> Self {
        Address(value as u32 as u64)
    }

    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Address(ptr.expose_addr() as u64)
    }

    pub fn from_mut_ptr<T>(ptr: *mut T) -> Self {
        Address(ptr.expose_addr() as u64)
    }

    pub fn as_ptr<T>(self) -> *const T {
        sptr::from_exposed_addr(self.0 as usize)
    }

    pub fn as_mut_ptr<T>(self) -> *mut T {
        sptr::from_exposed_addr_mut(self.0 as usize)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:#x})", self.0)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for Address {
    fn from(address: u64) -> Self {
        Address(address)
    }
}

impl From<Address> for u64 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl Add<u64> for Address {
    type Output = Self;
    fn add(self, rhs: u64) -> Self {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address {
    type Output = Self;
    fn sub(self, rhs: u64) -> Self {
        Address(self.0.wrapping_sub(rhs))
    }
}

impl Sub<Address> for Address {
    type Output = u64;
    fn sub(self, rhs: Address) -> u64 {
        self.0.wrapping_sub(rhs.0)
    }
}

impl AddAssign<u64> for Address {
    fn add_assign(&mut self, rhs: u64) {
        self.0 = self.0.wrapping_add(rhs);
    }
}

impl SubAssign<u64> for Address {
    fn sub_assign(&mut self, rhs: u64) {
        self.0 = self.0.wrapping_sub(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::Address;

    #[test]
    fn widening_keeps_the_bit_pattern() {
        assert_eq!(Address::from_i32_bits(0x1234), Address(0x1234));
        assert_eq!(Address::from_i32_bits(-1), Address(0xFFFF_FFFF));
        assert_eq!(Address::from_i32_bits(i32::MIN), Address(0x8000_0000));
    }

    #[test]
    fn arithmetic() {
        let base = Address(0x1000);
        assert_eq!(base + 8, Address(0x1008));
        assert_eq!(base - 0x10, Address(0xFF0));
        assert_eq!((base + 24) - base, 24);

        let mut cursor = base;
        cursor += 4;
        cursor -= 1;
        assert_eq!(cursor, Address(0x1003));
        assert!(base < cursor);
    }

    #[test]
    fn pointer_round_trip() {
        let value = 42u32;
        let address = Address::from_ptr(&value);
        assert!(!address.is_null());
        assert_eq!(unsafe { *address.as_ptr::<u32>() }, 42);
    }

    #[test]
    fn formatting() {
        assert_eq!(Address(0xBEEF).to_string(), "0xbeef");
        assert_eq!(format!("{:?}", Address::NULL), "Address(0x0)");
        assert_eq!(format!("{:x}", Address(255)), "ff");
    }
}
