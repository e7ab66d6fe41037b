use crate::video::{classify, AspectClass};

/// Pixel dimensions of a video stream. Both sides are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaGeometry {
    width: u32,
    height: u32,
}

impl MediaGeometry {
    /// `None` when either dimension is zero
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_class(&self) -> AspectClass {
        classify(self.width, self.height)
    }
}
