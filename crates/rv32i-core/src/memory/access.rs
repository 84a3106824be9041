use super::AddressSpace;

/// Reads a little-endian halfword as two single-byte reads, low byte first.
pub fn read_u16_le<B: AddressSpace + ?Sized>(bus: &mut B, addr: u32) -> u16 {
    let lo = bus.read_byte(addr);
    let hi = bus.read_byte(addr.wrapping_add(1));
    u16::from_le_bytes([lo, hi])
}

/// Reads a little-endian word as four single-byte reads, low byte first.
pub fn read_u32_le<B: AddressSpace + ?Sized>(bus: &mut B, addr: u32) -> u32 {
    let b0 = bus.read_byte(addr);
    let b1 = bus.read_byte(addr.wrapping_add(1));
    let b2 = bus.read_byte(addr.wrapping_add(2));
    let b3 = bus.read_byte(addr.wrapping_add(3));
    u32::from_le_bytes([b0, b1, b2, b3])
}

/// Writes the low halfword of `value`, low byte first.
pub fn write_u16_le<B: AddressSpace + ?Sized>(bus: &mut B, addr: u32, value: u16) {
    for (offset, byte) in (0_u32..).zip(value.to_le_bytes()) {
        bus.write_byte(addr.wrapping_add(offset), byte);
    }
}

/// Writes `value`, low byte first.
pub fn write_u32_le<B: AddressSpace + ?Sized>(bus: &mut B, addr: u32, value: u32) {
    for (offset, byte) in (0_u32..).zip(value.to_le_bytes()) {
        bus.write_byte(addr.wrapping_add(offset), byte);
    }
}
