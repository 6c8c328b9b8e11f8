use std::ops::Range;

use crate::errors::{Result, ThenThanError};

/// Maximum half-width of a context window.
pub const MAX_WINDOW_SIZE: u8 = 127;

/// A tag observed at a fixed offset from the target word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub(crate) offset: i8,
    pub(crate) tag: String,
}

impl Slot {
    /// Offset relative to the target word. Never zero.
    pub const fn offset(&self) -> i8 {
        self.offset
    }

    /// Gets the tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// Tags surrounding one occurrence of a target word.
///
/// Slots are ordered by offset. Offsets that fall outside the sentence are absent, and
/// the slot of the target word itself is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    pub(crate) window_size: u8,
    pub(crate) slots: Vec<Slot>,
}

/// Returns the token range `[index - window_size, index + window_size]` clipped to a
/// sequence of `len` tokens.
pub fn window_range(len: usize, index: usize, window_size: u8) -> Range<usize> {
    let w = usize::from(window_size);
    index.saturating_sub(w)..len.min(index + w + 1)
}

impl ContextWindow {
    /// Extracts the context of the token at `index`.
    ///
    /// # Arguments
    ///
    /// * `tags` - Tags of the whole sentence.
    /// * `index` - Position of the target word.
    /// * `window_size` - Number of slots on each side of the target word.
    ///
    /// # Returns
    ///
    /// A context window.
    ///
    /// # Errors
    ///
    /// If `window_size` is 0 or greater than [`MAX_WINDOW_SIZE`], or `index` is out of
    /// range, an error variant will be returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use thenthan::ContextWindow;
    ///
    /// let tags = ["CC", "RB", "PPSS", "VBD"];
    /// let w = ContextWindow::extract(&tags, 1, 2).unwrap();
    /// assert_eq!(vec!["Slot-1_CC", "Slot1_PPSS", "Slot2_VBD"], w.column_names());
    /// ```
    pub fn extract<S>(tags: &[S], index: usize, window_size: u8) -> Result<Self>
    where
        S: AsRef<str>,
    {
        if window_size == 0 || window_size > MAX_WINDOW_SIZE {
            return Err(ThenThanError::configuration(
                "window_size",
                format!("must be in 1..={}", MAX_WINDOW_SIZE),
            ));
        }
        if index >= tags.len() {
            return Err(ThenThanError::configuration(
                "index",
                format!("{} is out of range for {} tags", index, tags.len()),
            ));
        }
        let mut slots = Vec::with_capacity(usize::from(window_size) * 2);
        for i in window_range(tags.len(), index, window_size) {
            if i == index {
                continue;
            }
            // |i - index| <= window_size <= 127
            let offset = (i as isize - index as isize) as i8;
            slots.push(Slot {
                offset,
                tag: tags[i].as_ref().to_string(),
            });
        }
        Ok(Self { window_size, slots })
    }

    /// Creates a context window from explicit `(offset, tag)` pairs.
    ///
    /// # Errors
    ///
    /// If an offset is 0, lies outside the window, or appears twice, an error variant
    /// will be returned.
    pub fn from_slots<I, S>(window_size: u8, slots: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i8, S)>,
        S: Into<String>,
    {
        if window_size == 0 || window_size > MAX_WINDOW_SIZE {
            return Err(ThenThanError::configuration(
                "window_size",
                format!("must be in 1..={}", MAX_WINDOW_SIZE),
            ));
        }
        let mut slots: Vec<Slot> = slots
            .into_iter()
            .map(|(offset, tag)| Slot {
                offset,
                tag: tag.into(),
            })
            .collect();
        slots.sort_by_key(|s| s.offset);
        for (i, slot) in slots.iter().enumerate() {
            if slot.offset == 0 || slot.offset.unsigned_abs() > window_size {
                return Err(ThenThanError::configuration(
                    "slots",
                    format!("offset {} is outside the window", slot.offset),
                ));
            }
            if i != 0 && slots[i - 1].offset == slot.offset {
                return Err(ThenThanError::configuration(
                    "slots",
                    format!("offset {} appears twice", slot.offset),
                ));
            }
        }
        Ok(Self { window_size, slots })
    }

    /// Gets the half-width this window was extracted with.
    pub const fn window_size(&self) -> u8 {
        self.window_size
    }

    /// Gets the slots.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Gets the tag at the given offset, if the sentence covers it.
    pub fn get(&self, offset: i8) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.offset == offset)
            .map(|s| s.tag.as_str())
    }

    /// Gets the one-hot column names of the active slots.
    pub fn column_names(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|s| column_name(s.offset, &s.tag))
            .collect()
    }
}

/// Formats a one-hot column name such as `Slot-1_CC`.
pub fn column_name(offset: i8, tag: &str) -> String {
    format!("Slot{}_{}", offset, tag)
}
