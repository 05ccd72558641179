/// Writes length-prefixed fields: `[u32 LE length][payload]` for every value,
/// fixed width integers included.
pub struct FieldWriter {
    buffer: Vec<u8>,
}

impl FieldWriter {
    pub fn new(tag: u8) -> FieldWriter {
        let mut buffer = Vec::with_capacity(256);
        buffer.push(tag);
        FieldWriter { buffer }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buffer.extend((bytes.len() as u32).to_le_bytes());
        self.buffer.extend_from_slice(bytes);
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_string(&mut self, value: &str) -> &mut Self {
        self.write_bytes(value.as_bytes())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_are_length_prefixed() {
        let mut writer = FieldWriter::new(9);
        writer.write_u32(7).write_u64(1);
        let bytes = writer.into_bytes();

        assert_eq!(bytes[0], 9);
        assert_eq!(&bytes[1..5], &4_u32.to_le_bytes());
        assert_eq!(&bytes[5..9], &7_u32.to_le_bytes());
        assert_eq!(&bytes[9..13], &8_u32.to_le_bytes());
        assert_eq!(&bytes[13..21], &1_u64.to_le_bytes());
        assert_eq!(bytes.len(), 21);
    }

    #[test]
    fn test_empty_string() {
        let mut writer = FieldWriter::new(2);
        writer.write_string("");
        assert_eq!(writer.into_bytes(), vec![2, 0, 0, 0, 0]);
    }
}
