use crate::RECEIVE_BUFFER_SIZE;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::{Error, ErrorKind};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, Result};

/// Trait to allow for writing and reading RCON frames on the socket.
///
/// Reads are not reassembled: one call to [`read_frame`](ReadWriteRconFrame::read_frame)
/// performs exactly one read of at most [`RECEIVE_BUFFER_SIZE`] bytes.
#[async_trait]
pub(crate) trait ReadWriteRconFrame {
    /// Write a complete frame and flush it.
    async fn write_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Perform a single read, returning the bytes that arrived.
    /// Returns an [`ErrorKind::UnexpectedEof`] error if the peer closed the connection.
    async fn read_frame(&mut self) -> Result<Bytes>;
}

#[async_trait]
impl<T> ReadWriteRconFrame for T
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.write_all(frame).await?;
        self.flush().await
    }

    async fn read_frame(&mut self) -> Result<Bytes> {
        let mut buffer = vec![0; RECEIVE_BUFFER_SIZE];
        let read = self.read(&mut buffer).await?;

        if read == 0 {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                "connection closed by server",
            ));
        }

        buffer.truncate(read);
        Ok(Bytes::from(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::ReadWriteRconFrame;
    use crate::{packet, RECEIVE_BUFFER_SIZE};
    use std::io::ErrorKind;
    use tokio::io::{self, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn write_frame_sends_all_bytes() -> io::Result<()> {
        let (mut client, mut server) = io::duplex(64);
        let frame = packet::encode(3, b"secret", 7);

        client.write_frame(&frame).await?;

        let mut received = vec![0; frame.len()];
        server.read_exact(&mut received).await?;
        assert_eq!(&received[..], &frame[..]);

        Ok(())
    }

    #[tokio::test]
    async fn read_frame_is_a_single_read() -> io::Result<()> {
        let (mut client, mut server) = io::duplex(2 * RECEIVE_BUFFER_SIZE);
        let big = vec![b'a'; RECEIVE_BUFFER_SIZE + 100];

        server.write_all(&big).await?;

        let first = client.read_frame().await?;
        assert_eq!(first.len(), RECEIVE_BUFFER_SIZE);

        Ok(())
    }

    #[tokio::test]
    async fn read_frame_reports_eof() {
        let (mut client, server) = io::duplex(64);
        drop(server);

        let err = client.read_frame().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }
}
