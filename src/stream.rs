//! Async event stream for extraction runs.
//!
//! [`extract_stream`] runs an [`ExtractionPipeline`] on a blocking thread
//! and streams its progress back as [`PipelineEvent`]s: zero or more
//! `Progress` events, then exactly one `Finished` or `Failed`.
//!
//! Decoding and encoding happen on `tokio::task::spawn_blocking`, so the
//! runtime's worker threads stay free for whatever renders the progress.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use framesplit::{ExtractOptions, PipelineEvent};
//!
//! # async fn example() {
//! let mut events = framesplit::extract_stream("input.mp4", "frames", ExtractOptions::new());
//! while let Some(event) = events.next().await {
//!     match event {
//!         PipelineEvent::Progress(progress) => {
//!             println!("{}/{}", progress.processed, progress.total)
//!         }
//!         PipelineEvent::Finished(report) => println!("{report}"),
//!         PipelineEvent::Failed(error) => eprintln!("{error}"),
//!     }
//! }
//! # }
//! ```

use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use crate::config::ExtractOptions;
use crate::error::ExtractError;
use crate::pipeline::ExtractionPipeline;
use crate::progress::{ProgressCallback, ProgressEvent};
use crate::report::ExtractionReport;

/// Channel capacity. Progress events are small, so a generous buffer keeps
/// the decode thread from stalling on a slow consumer.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// One item of an [`ExtractionStream`].
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Progress(ProgressEvent),
    /// Terminal: the run completed.
    Finished(ExtractionReport),
    /// Terminal: the run aborted.
    Failed(ExtractError),
}

/// Stream of [`PipelineEvent`]s produced by a background extraction.
///
/// Dropping the stream does not stop the background run; use a
/// [`CancellationToken`](crate::CancellationToken) in the options for that.
pub struct ExtractionStream {
    receiver: Receiver<PipelineEvent>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl Stream for ExtractionStream {
    type Item = PipelineEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Forwards progress into the channel, then to the caller's own callback.
struct ChannelProgress {
    sender: Sender<PipelineEvent>,
    inner: Arc<dyn ProgressCallback>,
}

impl ProgressCallback for ChannelProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        // The receiver may have been dropped; the run continues regardless.
        let _ = self.sender.blocking_send(PipelineEvent::Progress(event.clone()));
        self.inner.on_progress(event);
    }

    fn on_summary(&self, report: &ExtractionReport) {
        self.inner.on_summary(report);
    }
}

/// Start extracting `source` into `output_dir` on a blocking thread.
///
/// Must be called from within a Tokio runtime.
pub fn extract_stream<S, O>(source: S, output_dir: O, options: ExtractOptions) -> ExtractionStream
where
    S: Into<PathBuf>,
    O: Into<PathBuf>,
{
    let source = source.into();
    let output_dir = output_dir.into();
    let (sender, receiver) = tokio::sync::mpsc::channel(DEFAULT_CHANNEL_CAPACITY);

    let handle = tokio::task::spawn_blocking(move || {
        let forwarding = Arc::new(ChannelProgress {
            sender: sender.clone(),
            inner: options.progress.clone(),
        });
        let mut pipeline = ExtractionPipeline::new(options.with_progress(forwarding));

        let last = match pipeline.run(&source, &output_dir) {
            Ok(report) => PipelineEvent::Finished(report),
            Err(error) => PipelineEvent::Failed(error),
        };
        let _ = sender.blocking_send(last);
    });

    ExtractionStream { receiver, handle }
}
