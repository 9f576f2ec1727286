/// Payload length of one panel region on the reference hardware.
pub const DEFAULT_PAYLOAD_LEN: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Every dot off.
    Black,
    /// Every dot on. The high bit stays clear so data never reaches 0x80.
    White,
}

impl Pattern {
    pub fn byte(self) -> u8 {
        match self {
            Pattern::Black => 0x00,
            Pattern::White => 0x7F,
        }
    }

    pub fn payload(self, len: usize) -> Vec<u8> {
        vec![self.byte(); len]
    }
}
