//! Frame source trait abstraction

use crate::{FrameResult, RawFrame, Resolution};

/// Result of asking a source for the next frame
#[derive(Debug)]
pub enum ReadOutcome<'a> {
    /// A complete frame
    Frame(RawFrame<'a>),
    /// The source ended partway through a frame
    Partial { expected: usize, got: usize },
    /// The source is exhausted
    End,
}

/// Produces raw frames one at a time.
///
/// A returned frame borrows the source's buffer and is invalidated by the
/// next call.
pub trait FrameSource {
    /// Resolution of every frame this source produces
    fn resolution(&self) -> Resolution;

    /// Read the next frame
    fn next_frame(&mut self) -> FrameResult<ReadOutcome<'_>>;
}
