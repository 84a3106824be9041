//! Address-space port and byte-assembly helpers.
//!
//! The core never owns a backing store. Every access it makes goes through
//! [`AddressSpace::read_byte`] and [`AddressSpace::write_byte`], one byte at a
//! time; multi-byte values are assembled here in little-endian order.

/// Little-endian multi-byte access built on single-byte port calls.
pub mod access;
/// Flat zero-initialised RAM implementation of the port.
pub mod flat;

pub use access::{read_u16_le, read_u32_le, write_u16_le, write_u32_le};
pub use flat::FlatMemory;

/// Host-supplied byte-addressable 32-bit address space.
///
/// Neither operation can fail. Addresses the host does not back must still
/// read as a defined value, and writes to them may simply be dropped; that
/// policy belongs entirely to the implementor.
pub trait AddressSpace {
    /// Reads one byte. May have device side effects (e.g. dequeuing input).
    fn read_byte(&mut self, addr: u32) -> u8;

    /// Writes one byte.
    fn write_byte(&mut self, addr: u32, value: u8);
}

impl<T: AddressSpace + ?Sized> AddressSpace for &mut T {
    fn read_byte(&mut self, addr: u32) -> u8 {
        (**self).read_byte(addr)
    }

    fn write_byte(&mut self, addr: u32, value: u8) {
        (**self).write_byte(addr, value);
    }
}
