use std::borrow::Cow;

use crate::foundation::core::{Picture, Rect, Size};
use crate::foundation::error::AnimResult;
use crate::picture::{crop, rescale};

/// Picture handle that borrows its source until the first mutation.
///
/// Each destination of a transform holds its own handle over the shared intermediate, so a
/// crop or rescale on one handle is never observed by another.
#[derive(Debug, Clone)]
pub struct CowPicture<'a> {
    inner: Cow<'a, Picture>,
}

impl<'a> CowPicture<'a> {
    /// Borrow `picture` without copying.
    pub fn borrowed(picture: &'a Picture) -> Self {
        Self {
            inner: Cow::Borrowed(picture),
        }
    }

    /// Take ownership of `picture`.
    pub fn owned(picture: Picture) -> Self {
        Self {
            inner: Cow::Owned(picture),
        }
    }

    /// Current pixels.
    pub fn picture(&self) -> &Picture {
        &self.inner
    }

    /// Current dimensions.
    pub fn size(&self) -> Size {
        Size::of(&self.inner)
    }

    /// `true` once the handle holds a private copy.
    pub fn is_owned(&self) -> bool {
        matches!(self.inner, Cow::Owned(_))
    }

    /// Restrict the pixels to `rect`.
    pub fn crop(&mut self, rect: Rect) -> AnimResult<()> {
        if rect == Rect::full(self.size()) {
            return Ok(());
        }
        self.inner = Cow::Owned(crop(&self.inner, rect)?);
        Ok(())
    }

    /// Resample the pixels to `size`.
    pub fn rescale(&mut self, size: Size) -> AnimResult<()> {
        if size == self.size() {
            return Ok(());
        }
        self.inner = Cow::Owned(rescale(&self.inner, size)?);
        Ok(())
    }

    /// Mutable access, copying the borrowed source first if needed.
    pub fn to_mut(&mut self) -> &mut Picture {
        self.inner.to_mut()
    }

    /// Consume the handle, copying only if still borrowed.
    pub fn into_owned(self) -> Picture {
        self.inner.into_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/picture/cow.rs"]
mod tests;
