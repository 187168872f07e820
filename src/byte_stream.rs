//! Bridge from blocking chunk iterators to an async byte stream that a
//! transport can use directly as a response body.

use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;
use tracing::debug;

/// Default number of chunks buffered between producer and consumer.
pub const DEFAULT_BUFFER: usize = 2;

/// Drive `chunks` on tokio's blocking pool and expose the items as a
/// [`Stream`].
///
/// At most `buffer` chunks are held ahead of the consumer. Dropping the
/// returned stream stops the producer at its next send, which drops the
/// iterator. Must be called from within a tokio runtime.
pub fn into_async_stream<I, E>(chunks: I, buffer: usize) -> impl Stream<Item = Result<Bytes, E>>
where
    I: Iterator<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    let (tx, rx) = mpsc::channel(buffer.max(1));
    tokio::task::spawn_blocking(move || {
        for chunk in chunks {
            if tx.blocking_send(chunk).is_err() {
                debug!("byte stream consumer went away");
                break;
            }
        }
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    })
}
