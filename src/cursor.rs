/// Cursor shape requested by the window manager.
///
/// Client-requested cursors are the business of the seat collaborator; the window manager only
/// overrides the shape while a drag session is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorImage {
    #[default]
    Default,
    Move,
    Resize,
}

impl CursorImage {
    /// Name of the image in an xcursor theme.
    pub fn name(self) -> &'static str {
        match self {
            CursorImage::Default => "default",
            CursorImage::Move => "grabbing",
            CursorImage::Resize => "se-resize",
        }
    }
}

#[derive(Debug, Default)]
pub struct CursorManager {
    image: CursorImage,
}

impl CursorManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor_image(&self) -> CursorImage {
        self.image
    }

    /// Sets the cursor image, returning whether it changed.
    pub fn set_cursor_image(&mut self, image: CursorImage) -> bool {
        if self.image == image {
            return false;
        }

        trace!("cursor image: {}", image.name());
        self.image = image;
        true
    }
}
