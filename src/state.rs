use std::ops::BitOr;

/// Addressable memory, shared by code and stack.
pub const MEMORY_SIZE: usize = 0x100;

/// Register used as the stack pointer.
pub const SP: u8 = 7;

/// Initial stack pointer. The stack grows down from here.
pub const SP_INIT: u8 = 0xF4;

/// 256 bytes of flat memory.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Memory {
    cells: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            cells: [0; MEMORY_SIZE],
        }
    }

    /// `None` if `address` lies past the end of memory.
    pub fn read(&self, address: usize) -> Option<u8> {
        self.cells.get(address).copied()
    }

    /// Returns `false` without writing if `address` lies past the end of memory.
    #[must_use]
    pub fn write(&mut self, address: usize, value: u8) -> bool {
        match self.cells.get_mut(address) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Copy `bytes` in starting at address 0. Caller guarantees they fit.
    pub fn load(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= MEMORY_SIZE, "image larger than memory");
        self.cells[..bytes.len()].copy_from_slice(bytes);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// 8x 8-bit registers. R7 is the stack pointer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Registers([u8; 8]);

impl Registers {
    pub fn new() -> Self {
        let mut reg = [0; 8];
        reg[SP as usize] = SP_INIT;
        Registers(reg)
    }

    /// `None` for anything but R0 to R7.
    pub fn get(&self, index: u8) -> Option<u8> {
        self.0.get(index as usize).copied()
    }

    pub fn get_mut(&mut self, index: u8) -> Option<&mut u8> {
        self.0.get_mut(index as usize)
    }

    pub fn sp(&self) -> u8 {
        self.0[SP as usize]
    }

    pub fn set_sp(&mut self, value: u8) {
        self.0[SP as usize] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of the last `CMP`. Written only by `CMP`, read only by conditional jumps.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Flags(u8);

impl Flags {
    /// Nothing compared yet.
    pub const NONE: Flags = Flags(0);
    pub const EQUAL: Flags = Flags(0b001);
    pub const GREATER: Flags = Flags(0b010);
    pub const LESS: Flags = Flags(0b100);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Any bit of `other` is set.
    pub fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}
