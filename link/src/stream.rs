//! Streaming delivery of query results.
//!
//! [`QueryStream`] runs a [`Pager`] on a background task and hands each page
//! to the consumer through a bounded channel, so the producer fetches at
//! most `capacity` pages ahead of what has been read. The channel is closed
//! exactly once, when the producer task ends: after the last page, after
//! the single error event of a failed execution, or on cancellation.

use futures_util::Stream;
use log::debug;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{BqLinkError, Result};
use crate::models::{QueryResult, StreamEvent};
use crate::paging::Pager;

/// Receiving end of a streamed query.
///
/// # Examples
///
/// ```rust,no_run
/// # async fn run(client: bq_link::BqLinkClient) -> bq_link::Result<()> {
/// use bq_link::QuerySpec;
///
/// let spec = QuerySpec::new("my-project", "sales", "SELECT * FROM orders");
/// let mut stream = client.stream_query(spec);
/// while let Some(event) = stream.next().await {
///     if let Some(err) = event.error {
///         return Err(err);
///     }
///     if let Some(headers) = &event.headers {
///         println!("columns: {:?}", headers);
///     }
///     println!("{} rows", event.rows.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct QueryStream {
    event_rx: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
    _producer: Option<JoinHandle<()>>,
    closed: bool,
}

impl QueryStream {
    /// Start producing pages from `pager` on a spawned task.
    pub(crate) fn spawn(pager: Pager, capacity: usize) -> Self {
        let (event_tx, event_rx) = mpsc::channel(capacity.max(1));
        let cancel = pager.cancellation_token();
        let producer = tokio::spawn(produce(pager, event_tx, cancel.clone()));
        Self {
            event_rx,
            cancel,
            _producer: Some(producer),
            closed: false,
        }
    }

    /// Receive the next event. Returns `None` once the channel is closed.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        if self.closed {
            return None;
        }
        match self.event_rx.recv().await {
            Some(event) => Some(event),
            None => {
                self.closed = true;
                None
            },
        }
    }

    /// Stop the producer, even one waiting for room in the channel. Events
    /// already buffered can still be read.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once the end of the stream has been observed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Drain the stream into a buffered result, failing on the first error
    /// event.
    pub async fn collect(mut self) -> Result<QueryResult> {
        let mut result = QueryResult::default();
        while let Some(event) = self.next().await {
            if let Some(err) = event.error {
                return Err(err);
            }
            if let Some(headers) = event.headers {
                result.headers = headers;
            }
            result.rows.extend(event.rows);
        }
        Ok(result)
    }
}

impl Stream for QueryStream {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(None);
        }
        match this.event_rx.poll_recv(cx) {
            Poll::Ready(None) => {
                this.closed = true;
                Poll::Ready(None)
            },
            other => other,
        }
    }
}

impl Drop for QueryStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for QueryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryStream")
            .field("closed", &self.closed)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Producer loop. Owns the only sender, so returning closes the channel.
async fn produce(mut pager: Pager, event_tx: mpsc::Sender<StreamEvent>, cancel: CancellationToken) {
    let mut sent_headers: Option<Vec<String>> = None;
    let mut pages = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = event_tx.closed() => {
                debug!("[BQ_STREAM] Receiver dropped after {} pages, stopping", pages);
                return;
            },
            _ = cancel.cancelled() => Err(BqLinkError::Cancelled),
            next = pager.next_page() => next,
        };

        match next {
            Ok(Some(page)) => {
                pages += 1;
                let headers = if sent_headers.as_ref() != Some(&page.headers) {
                    sent_headers = Some(page.headers.clone());
                    Some(page.headers)
                } else {
                    None
                };
                let sent = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("[BQ_STREAM] Cancelled after {} pages", pages);
                        let _ = event_tx.try_send(StreamEvent::failed(BqLinkError::Cancelled));
                        return;
                    },
                    sent = event_tx.send(StreamEvent::rows(headers, page.rows)) => sent,
                };
                if sent.is_err() {
                    debug!("[BQ_STREAM] Receiver dropped after {} pages, stopping", pages);
                    return;
                }
            },
            Ok(None) => {
                debug!("[BQ_STREAM] Completed after {} pages", pages);
                return;
            },
            Err(BqLinkError::Cancelled) => {
                debug!("[BQ_STREAM] Cancelled after {} pages", pages);
                // The consumer may have stopped reading; never block here.
                let _ = event_tx.try_send(StreamEvent::failed(BqLinkError::Cancelled));
                return;
            },
            Err(e) => {
                debug!("[BQ_STREAM] Failed after {} pages: {}", pages, e);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        let _ = event_tx.try_send(StreamEvent::failed(BqLinkError::Cancelled));
                    },
                    _ = event_tx.send(StreamEvent::failed(e)) => {},
                }
                return;
            },
        }
    }
}
