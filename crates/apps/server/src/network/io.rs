use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use voicechat_network::{message, NetworkError, NetworkResult};

/// Largest frame body accepted in either direction.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Read one length-prefixed frame body.
///
/// End of stream, whether before or inside a frame, is reported as
/// [`NetworkError::ConnectionClosed`].
pub async fn read_frame<R>(stream: &mut R) -> NetworkResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    read_exact(stream, &mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(NetworkError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }

    let mut data = vec![0u8; len];
    read_exact(stream, &mut data).await?;
    Ok(data)
}

/// Read a length-prefixed bincode message.
pub async fn read_message<T, R>(stream: &mut R) -> NetworkResult<T>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let data = read_frame(stream).await?;
    message::deserialize(&data)
}

/// Serialize a message with a length prefix and send it over the stream.
///
/// Returns the number of bytes written, prefix included.
pub async fn write_message<T, W>(stream: &mut W, message: &T) -> NetworkResult<usize>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let data = message::serialize(message)?;
    if data.len() > MAX_FRAME_LEN {
        return Err(NetworkError::FrameTooLarge {
            len: data.len(),
            max: MAX_FRAME_LEN,
        });
    }
    let len = (data.len() as u32).to_be_bytes();

    stream.write_all(&len).await?;
    stream.write_all(&data).await?;
    stream.flush().await?;

    Ok(len.len() + data.len())
}

async fn read_exact<R>(stream: &mut R, buf: &mut [u8]) -> NetworkResult<()>
where
    R: AsyncRead + Unpin,
{
    match stream.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(NetworkError::ConnectionClosed)
        }
        Err(err) => Err(err.into()),
    }
}
