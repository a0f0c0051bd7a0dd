use crate::animation::{AnimationSequence, FrameStep};
use crate::atlas::TileImage;
use crate::entity::EntityState;
use crate::error::ComponentError;
use crate::frame::FrameTime;
use std::rc::Rc;

/// Named animation sequences driving the owner's image.
#[derive(Debug, Clone, Default)]
pub struct AnimationComponent {
    sequences: Vec<(String, AnimationSequence)>,
    current: Option<String>,
    fallback: Option<Rc<TileImage>>,
}

impl AnimationComponent {
    /// A component with no sequences.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for a component holding a single sequence.
    pub fn with_sequence(key: impl Into<String>, sequence: AnimationSequence) -> Self {
        let mut component = Self::new();
        component.add_animation([(key.into(), sequence)]);
        component
    }

    /// Adds or replaces sequences. When nothing is playing yet, the first
    /// sequence added becomes current and starts.
    pub fn add_animation<K, I>(&mut self, sequences: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, AnimationSequence)>,
    {
        for (key, sequence) in sequences {
            let key = key.into();
            match self.sequences.iter_mut().find(|(k, _)| *k == key) {
                Some((_, slot)) => *slot = sequence,
                None => self.sequences.push((key, sequence)),
            }
        }
        if self.current.is_none() {
            if let Some((first, sequence)) = self.sequences.first_mut() {
                sequence.restart();
                self.current = Some(first.clone());
            }
        }
    }

    /// Key of the playing sequence.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Sequence stored under `key`.
    pub fn sequence(&self, key: &str) -> Option<&AnimationSequence> {
        self.sequences.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    /// Mutable access to the sequence under `key`.
    pub fn sequence_mut(&mut self, key: &str) -> Option<&mut AnimationSequence> {
        self.sequences
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, s)| s)
    }

    /// Sequence keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sequences.iter().map(|(k, _)| k.as_str())
    }

    /// Image shown once a non-looping sequence is exhausted; captured from
    /// the owner when the component is attached.
    pub fn fallback(&self) -> Option<&Rc<TileImage>> {
        self.fallback.as_ref()
    }

    /// Makes `key` current and rewinds it. `None` stops playback.
    pub fn switch_to(&mut self, key: Option<&str>) -> Result<(), ComponentError> {
        match key {
            None => {
                self.current = None;
                Ok(())
            }
            Some(key) => {
                let seq = self
                    .sequence_mut(key)
                    .ok_or_else(|| ComponentError::UnknownAnimationKey(key.to_owned()))?;
                seq.restart();
                self.current = Some(key.to_owned());
                Ok(())
            }
        }
    }

    fn resolve(&self, key: Option<&str>) -> Result<Option<String>, ComponentError> {
        match key {
            Some(k) if self.sequence(k).is_none() => {
                Err(ComponentError::UnknownAnimationKey(k.to_owned()))
            }
            Some(k) => Ok(Some(k.to_owned())),
            None => Ok(self.current.clone()),
        }
    }

    /// Frame duration (ms) of the named or current sequence; 0 when nothing
    /// is current.
    pub fn animation_speed(&self, key: Option<&str>) -> Result<u32, ComponentError> {
        Ok(self
            .resolve(key)?
            .and_then(|k| self.sequence(&k))
            .map_or(0, |s| s.frame_duration))
    }

    /// Sets the frame duration (ms) of the named or current sequence.
    pub fn set_animation_speed(&mut self, speed: u32, key: Option<&str>) -> Result<(), ComponentError> {
        if let Some(k) = self.resolve(key)? {
            if let Some(seq) = self.sequence_mut(&k) {
                seq.frame_duration = speed;
            }
        }
        Ok(())
    }

    /// Pauses (`active = false`) or resumes the named or current sequence.
    pub fn pause(&mut self, active: bool, key: Option<&str>) -> Result<(), ComponentError> {
        if let Some(k) = self.resolve(key)? {
            if let Some(seq) = self.sequence_mut(&k) {
                seq.running = active;
            }
        }
        Ok(())
    }

    pub(crate) fn on_added(&mut self, owner: &mut EntityState) {
        self.fallback = Some(owner.image.clone());
    }

    pub(crate) fn on_removed(&mut self, owner: &mut EntityState) {
        if let Some(img) = self.fallback.take() {
            owner.image = img;
        }
    }

    pub(crate) fn update(&mut self, owner: &mut EntityState, time: FrameTime) {
        let Some(key) = self.current.clone() else {
            return;
        };
        let Some(seq) = self.sequence_mut(&key) else {
            return;
        };
        match seq.advance(time.now) {
            FrameStep::Frame(img) => owner.image = img,
            FrameStep::Exhausted => {
                if let Some(img) = &self.fallback {
                    owner.image = img.clone();
                }
            }
        }
    }
}
