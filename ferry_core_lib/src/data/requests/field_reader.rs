use crate::errors::{FerryError, Result};

/// Cursor over the length-prefixed fields written by [`super::FieldWriter`].
pub struct FieldReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> FieldReader<'a> {
    /// Starts reading right after the one-byte type tag.
    pub fn new(buffer: &'a [u8]) -> FieldReader<'a> {
        FieldReader {
            buffer,
            position: 1,
        }
    }

    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let header_end = self.position + 4;
        if header_end > self.buffer.len() {
            return Err(FerryError::MalformedFrame(format!(
                "field length at offset {} runs past end of {} byte request",
                self.position,
                self.buffer.len()
            )));
        }

        let mut header = [0_u8; 4];
        header.copy_from_slice(&self.buffer[self.position..header_end]);
        let field_length = u32::from_le_bytes(header) as usize;

        let field_end = header_end
            .checked_add(field_length)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| {
                FerryError::MalformedFrame(format!(
                    "field at offset {} declares {} bytes but only {} remain",
                    self.position,
                    field_length,
                    self.buffer.len() - header_end
                ))
            })?;

        let field = &self.buffer[header_end..field_end];
        self.position = field_end;
        Ok(field)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let field = self.read_bytes()?;
        let bytes: [u8; 4] = field.try_into().map_err(|_| {
            FerryError::MalformedFrame(format!(
                "expected 4 byte integer, got {} bytes",
                field.len()
            ))
        })?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let field = self.read_bytes()?;
        let bytes: [u8; 8] = field.try_into().map_err(|_| {
            FerryError::MalformedFrame(format!(
                "expected 8 byte integer, got {} bytes",
                field.len()
            ))
        })?;
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let field = self.read_bytes()?;
        String::from_utf8(field.to_vec())
            .map_err(|e| FerryError::MalformedFrame(format!("invalid utf-8 string field: {}", e)))
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }
}
