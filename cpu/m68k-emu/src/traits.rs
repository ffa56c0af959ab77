/// Memory and signal interface between the CPU and the host's memory map.
///
/// Addresses passed to these methods have already been masked to the configured model's
/// address bus width. Accesses must complete synchronously.
pub trait BusInterface {
    fn read_byte(&mut self, address: u32) -> u8;

    fn read_word(&mut self, address: u32) -> u16;

    fn write_byte(&mut self, address: u32, value: u8);

    fn write_word(&mut self, address: u32, value: u16);

    fn read_long_word(&mut self, address: u32) -> u32 {
        let high_word = self.read_word(address);
        let low_word = self.read_word(address.wrapping_add(2));

        (u32::from(high_word) << 16) | u32::from(low_word)
    }

    fn write_long_word(&mut self, address: u32, value: u32) {
        let high_word = (value >> 16) as u16;
        let low_word = value as u16;

        self.write_word(address, high_word);
        self.write_word(address.wrapping_add(2), low_word);
    }

    fn read_byte_signed(&mut self, address: u32) -> i32 {
        (self.read_byte(address) as i8).into()
    }

    fn read_word_signed(&mut self, address: u32) -> i32 {
        (self.read_word(address) as i16).into()
    }

    // Auto-vectored interrupt level; should be between 0 and 7, with 0 indicating no interrupt
    fn interrupt_level(&self) -> u8 {
        0
    }

    fn acknowledge_interrupt(&mut self, _interrupt_level: u8) {}

    /// Called when the RESET instruction asserts the external reset line.
    fn reset_devices(&mut self) {}
}
