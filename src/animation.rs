use crate::atlas::TileImage;
use crate::error::ComponentError;
use std::rc::Rc;

/// Result of asking a sequence for the next displayable frame.
#[derive(Debug, Clone)]
pub enum FrameStep {
    /// Show this image.
    Frame(Rc<TileImage>),
    /// A non-looping sequence ran past its last frame; the caller shows its
    /// fallback image instead.
    Exhausted,
}

/// A timed cursor over an ordered list of frames.
///
/// Time is supplied by the caller in seconds (see [`crate::FrameTime`]). The
/// elapsed-time baseline is taken from the first advance after a restart.
#[derive(Debug, Clone)]
pub struct AnimationSequence {
    frames: Vec<Rc<TileImage>>,
    /// Wrap to the first frame after the last one.
    pub looping: bool,
    /// Milliseconds each frame stays on screen.
    pub frame_duration: u32,
    /// When false the cursor is frozen.
    pub running: bool,
    cursor: usize,
    started: Option<f64>,
}

impl AnimationSequence {
    /// A sequence starting at its first frame. Fails on an empty frame list.
    pub fn new(
        frames: Vec<Rc<TileImage>>,
        looping: bool,
        frame_duration: u32,
    ) -> Result<Self, ComponentError> {
        if frames.is_empty() {
            return Err(ComponentError::EmptySequence);
        }
        Ok(AnimationSequence {
            frames,
            looping,
            frame_duration,
            running: true,
            cursor: 0,
            started: None,
        })
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false for a constructed sequence.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in display order.
    pub fn frames(&self) -> &[Rc<TileImage>] {
        &self.frames
    }

    /// Index of the next frame to show.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rewinds to the first frame; the clock restarts on the next advance.
    pub fn restart(&mut self) {
        self.cursor = 0;
        self.started = None;
    }

    /// Produces the frame to display at time `now` (seconds) and moves the
    /// cursor once `frame_duration` has elapsed.
    pub fn advance(&mut self, now: f64) -> FrameStep {
        if !self.running {
            let idx = self.cursor.min(self.frames.len() - 1);
            return FrameStep::Frame(self.frames[idx].clone());
        }

        if self.cursor >= self.frames.len() {
            if self.looping {
                self.cursor = 0;
            } else {
                return FrameStep::Exhausted;
            }
        }

        let frame = self.frames[self.cursor].clone();
        let started = *self.started.get_or_insert(now);
        if (now - started) * 1000.0 >= self.frame_duration as f64 {
            self.cursor += 1;
            self.started = Some(now);
        }
        FrameStep::Frame(frame)
    }

    /// A copy with every frame flipped.
    pub fn mirrored(&self, flip_x: bool, flip_y: bool) -> AnimationSequence {
        AnimationSequence {
            frames: self
                .frames
                .iter()
                .map(|f| Rc::new(f.flipped(flip_x, flip_y)))
                .collect(),
            ..self.clone()
        }
    }

    /// Appends another sequence's frames after this one's.
    pub fn append(&mut self, other: &AnimationSequence) {
        self.frames.extend(other.frames.iter().cloned());
    }
}
