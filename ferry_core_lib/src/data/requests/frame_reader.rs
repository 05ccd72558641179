use tokio::io::{AsyncRead, AsyncReadExt};

use crate::errors::{FerryError, Result};

pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;
const LEN_SIZE: usize = 4;

/// Accumulates socket reads until a whole frame is present. Bytes read past
/// the end of a frame stay buffered for the next frame or for whoever takes
/// over the socket afterwards.
pub struct FrameReader {
    buffer: Vec<u8>,
    read_size: usize,
}

impl FrameReader {
    pub fn new(read_size: usize) -> FrameReader {
        FrameReader {
            buffer: Vec::with_capacity(read_size),
            read_size: read_size.max(LEN_SIZE),
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Pops the next complete encoded request off the buffer, if one is present.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.buffer.len() < LEN_SIZE {
            return Ok(None);
        }

        let length_bytes = [self.buffer[0], self.buffer[1], self.buffer[2], self.buffer[3]];
        let frame_length = u32::from_le_bytes(length_bytes) as usize;

        if frame_length > MAX_FRAME_LEN {
            return Err(FerryError::MalformedFrame(format!(
                "declared frame length {} exceeds {}",
                frame_length, MAX_FRAME_LEN
            )));
        }

        if self.buffer.len() < LEN_SIZE + frame_length {
            return Ok(None);
        }

        let frame = self.buffer[LEN_SIZE..LEN_SIZE + frame_length].to_vec();
        self.buffer.drain(0..LEN_SIZE + frame_length);

        Ok(Some(frame))
    }

    /// Reads until one frame is complete. `Ok(None)` means the peer closed the
    /// connection cleanly before sending anything.
    pub async fn read_frame<R: AsyncRead + Unpin>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<Vec<u8>>> {
        let mut temp_buffer = vec![0_u8; self.read_size];

        loop {
            if let Some(frame) = self.next_frame()? {
                return Ok(Some(frame));
            }

            let bytes_read = reader.read(&mut temp_buffer).await?;
            trace!("Bytes read: {}", bytes_read);

            if bytes_read == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(FerryError::MalformedFrame(format!(
                    "connection closed with {} bytes of an incomplete frame",
                    self.buffer.len()
                )));
            }

            self.buffer.extend_from_slice(&temp_buffer[0..bytes_read]);
        }
    }

    /// Hands over whatever was read past the last frame.
    pub fn take_leftover(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::data::{
        requests::{decode_request, encode_frame, RequestBody, TransferCorrelation},
        ServerInfo,
    };

    fn sample_frame() -> (RequestBody, Vec<u8>) {
        let local = ServerInfo::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5000);
        let body = RequestBody::InboundFileTransferRequest {
            correlation: TransferCorrelation::new(99, 4),
            retry_counter: 0,
            retry_limit: 3,
            file_name: "report.pdf".to_string(),
            file_size: 10_000,
            source_folder: "/tmp/out".to_string(),
            destination_folder: "/tmp/in".to_string(),
        };
        let frame = encode_frame(&body, &local);
        (body, frame)
    }

    #[test]
    fn test_frame_split_at_every_offset() {
        let (body, frame) = sample_frame();

        for split in 0..=frame.len() {
            let mut reader = FrameReader::new(64);
            reader.push_bytes(&frame[..split]);
            let first = reader.next_frame().unwrap();

            if split < frame.len() {
                assert!(first.is_none());
                reader.push_bytes(&frame[split..]);
            }

            let encoded = first.or_else(|| reader.next_frame().unwrap()).unwrap();
            let (_, decoded) = decode_request(&encoded).unwrap();
            assert_eq!(decoded, body);
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let (body, frame) = sample_frame();
        let mut reader = FrameReader::new(64);
        let mut decoded = None;

        for byte in &frame {
            assert!(decoded.is_none());
            reader.push_bytes(&[*byte]);
            decoded = reader.next_frame().unwrap();
        }

        assert_eq!(decode_request(&decoded.unwrap()).unwrap().1, body);
    }

    #[test]
    fn test_bytes_after_frame_are_left_over() {
        let (_, frame) = sample_frame();
        let mut reader = FrameReader::new(64);
        reader.push_bytes(&frame);
        reader.push_bytes(&[1, 2, 3]);

        assert!(reader.next_frame().unwrap().is_some());
        assert_eq!(reader.take_leftover(), vec![1, 2, 3]);
        assert!(reader.take_leftover().is_empty());
    }

    #[test]
    fn test_oversized_declared_length() {
        let mut reader = FrameReader::new(64);
        reader.push_bytes(&(MAX_FRAME_LEN as u32 + 1).to_le_bytes());
        assert!(matches!(reader.next_frame(), Err(FerryError::MalformedFrame(_))));
    }

    #[tokio::test]
    async fn test_read_frame_over_partial_socket_writes() {
        let (body, frame) = sample_frame();
        let (mut client, mut server) = tokio::io::duplex(16);

        let writer_frame = frame.clone();
        let writer = tokio::spawn(async move {
            for chunk in writer_frame.chunks(5) {
                client.write_all(chunk).await.unwrap();
                tokio::task::yield_now().await;
            }
            client.write_all(b"tail").await.unwrap();
        });

        let mut reader = FrameReader::new(7);
        let encoded = reader.read_frame(&mut server).await.unwrap().unwrap();
        writer.await.unwrap();

        assert_eq!(decode_request(&encoded).unwrap().1, body);
    }

    #[tokio::test]
    async fn test_read_frame_closed_mid_frame() {
        let (_, frame) = sample_frame();
        let (mut client, mut server) = tokio::io::duplex(1024);
        client.write_all(&frame[..frame.len() - 3]).await.unwrap();
        drop(client);

        let mut reader = FrameReader::new(64);
        assert!(matches!(
            reader.read_frame(&mut server).await,
            Err(FerryError::MalformedFrame(_))
        ));
    }

    #[tokio::test]
    async fn test_read_frame_closed_before_anything() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);

        let mut reader = FrameReader::new(64);
        assert!(reader.read_frame(&mut server).await.unwrap().is_none());
    }
}
