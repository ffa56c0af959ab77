use crate::traits::BusInterface;
use thiserror::Error;

const MEMORY_LEN: usize = 0x0100_0000;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("image of {len} bytes at {address:06X} does not fit in 16MB of memory")]
    OutOfRange { address: u32, len: usize },
}

/// Flat 16MB big-endian RAM covering the whole 24-bit address space.
#[derive(Debug, Clone)]
pub struct InMemoryBus {
    memory: Vec<u8>,
    interrupt_level: u8,
    acknowledged_interrupts: Vec<u8>,
    reset_count: u32,
}

impl InMemoryBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: vec![0; MEMORY_LEN],
            interrupt_level: 0,
            acknowledged_interrupts: Vec::new(),
            reset_count: 0,
        }
    }

    /// Copy `bytes` into memory starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the image would extend past the end of memory.
    pub fn load(&mut self, address: u32, bytes: &[u8]) -> Result<(), BusError> {
        let start = address as usize;
        let end = start.checked_add(bytes.len()).filter(|&end| end <= MEMORY_LEN);
        let Some(end) = end else {
            return Err(BusError::OutOfRange { address, len: bytes.len() });
        };

        self.memory[start..end].copy_from_slice(bytes);

        Ok(())
    }

    /// Write a sequence of big-endian words starting at `address`.
    pub fn load_words(&mut self, address: u32, words: &[u16]) {
        for (i, &word) in words.iter().enumerate() {
            self.write_word(address.wrapping_add(2 * i as u32), word);
        }
    }

    pub fn set_interrupt_level(&mut self, level: u8) {
        self.interrupt_level = level & 0x07;
    }

    #[must_use]
    pub fn acknowledged_interrupts(&self) -> &[u8] {
        &self.acknowledged_interrupts
    }

    #[must_use]
    pub fn reset_count(&self) -> u32 {
        self.reset_count
    }

    fn index(address: u32) -> usize {
        (address as usize) & (MEMORY_LEN - 1)
    }
}

impl BusInterface for InMemoryBus {
    fn read_byte(&mut self, address: u32) -> u8 {
        self.memory[Self::index(address)]
    }

    fn read_word(&mut self, address: u32) -> u16 {
        let msb = self.memory[Self::index(address)];
        let lsb = self.memory[Self::index(address.wrapping_add(1))];
        u16::from_be_bytes([msb, lsb])
    }

    fn write_byte(&mut self, address: u32, value: u8) {
        self.memory[Self::index(address)] = value;
    }

    fn write_word(&mut self, address: u32, value: u16) {
        let [msb, lsb] = value.to_be_bytes();
        self.memory[Self::index(address)] = msb;
        self.memory[Self::index(address.wrapping_add(1))] = lsb;
    }

    fn interrupt_level(&self) -> u8 {
        self.interrupt_level
    }

    fn acknowledge_interrupt(&mut self, interrupt_level: u8) {
        self.acknowledged_interrupts.push(interrupt_level);
        self.interrupt_level = 0;
    }

    fn reset_devices(&mut self) {
        self.reset_count += 1;
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}
