use super::AddressSpace;

/// Zero-initialised RAM mapped at address 0.
///
/// Reads past the end return 0 and writes past the end are dropped, so the
/// port contract (never fail, always a defined value) holds for every address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMemory {
    bytes: Box<[u8]>,
}

impl FlatMemory {
    /// Allocates `len` zeroed bytes.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0; len].into_boxed_slice(),
        }
    }

    /// Copies `image` in starting at `offset`, clipping at the end of RAM.
    ///
    /// Returns the number of bytes actually copied.
    pub fn load(&mut self, offset: u32, image: &[u8]) -> usize {
        let Ok(start) = usize::try_from(offset) else {
            return 0;
        };
        let Some(window) = self.bytes.get_mut(start..) else {
            return 0;
        };
        let len = image.len().min(window.len());
        window[..len].copy_from_slice(&image[..len]);
        len
    }

    /// Returns the size of the backing store in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` when the backing store has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrows the backing store.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    fn index(&self, addr: u32) -> Option<usize> {
        usize::try_from(addr).ok().filter(|&i| i < self.bytes.len())
    }
}

impl AddressSpace for FlatMemory {
    fn read_byte(&mut self, addr: u32) -> u8 {
        self.index(addr).map_or(0, |i| self.bytes[i])
    }

    fn write_byte(&mut self, addr: u32, value: u8) {
        if let Some(i) = self.index(addr) {
            self.bytes[i] = value;
        }
    }
}
