use crate::RESET_VECTOR;
use crate::num::U16Ext;
use bincode::{Decode, Encode};

/// The data bus as seen from the CPU: every CPU-visible effect goes through these two calls.
pub trait BusInterface {
    fn read(&mut self, address: u16) -> u8;

    fn write(&mut self, address: u16, value: u8);
}

const ADDRESS_SPACE_LEN: usize = 64 * 1024;

/// 64KiB of plain RAM covering the entire 6502 address space.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct FlatMemoryBus {
    ram: Vec<u8>,
}

impl FlatMemoryBus {
    #[must_use]
    pub fn new() -> Self {
        Self { ram: vec![0; ADDRESS_SPACE_LEN] }
    }

    /// Copy `bytes` into memory starting at `address`, wrapping around at $FFFF.
    pub fn load(&mut self, address: u16, bytes: &[u8]) {
        let mut address = address;
        for &byte in bytes {
            self.ram[address as usize] = byte;
            address = address.wrapping_add(1);
        }
    }

    /// Point the RESET vector at `address`.
    pub fn set_reset_vector(&mut self, address: u16) {
        self.set_vector(RESET_VECTOR, address);
    }

    /// Write a little-endian pointer at `vector`.
    pub fn set_vector(&mut self, vector: u16, address: u16) {
        self.ram[vector as usize] = address.lsb();
        self.ram[vector.wrapping_add(1) as usize] = address.msb();
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.ram
    }
}

impl Default for FlatMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl BusInterface for FlatMemoryBus {
    #[inline]
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    #[inline]
    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_writes_across_the_whole_address_space() {
        let mut bus = FlatMemoryBus::new();

        bus.write(0x0000, 0x12);
        bus.write(0x8000, 0x34);
        bus.write(0xFFFF, 0x56);

        assert_eq!(bus.read(0x0000), 0x12);
        assert_eq!(bus.read(0x8000), 0x34);
        assert_eq!(bus.read(0xFFFF), 0x56);
        assert_eq!(bus.read(0x1234), 0x00);
    }

    #[test]
    fn load_wraps_at_end_of_address_space() {
        let mut bus = FlatMemoryBus::new();
        bus.load(0xFFFE, &[0xAA, 0xBB, 0xCC]);

        assert_eq!(bus.read(0xFFFE), 0xAA);
        assert_eq!(bus.read(0xFFFF), 0xBB);
        assert_eq!(bus.read(0x0000), 0xCC);
    }

    #[test]
    fn reset_vector_is_little_endian() {
        let mut bus = FlatMemoryBus::new();
        bus.set_reset_vector(0xC0DE);

        assert_eq!(bus.read(0xFFFC), 0xDE);
        assert_eq!(bus.read(0xFFFD), 0xC0);
    }

    #[test]
    fn vector_high_byte_wraps_to_zero_page() {
        let mut bus = FlatMemoryBus::new();
        bus.set_vector(0xFFFF, 0x1234);

        assert_eq!(bus.read(0xFFFF), 0x34);
        assert_eq!(bus.read(0x0000), 0x12);
    }
}
