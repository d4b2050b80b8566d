//! The composed-but-unpublished post.

/// An image the user attached to the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Draft input for one publish attempt. Cleared by the caller after a
/// successful publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub image: Option<ImageAttachment>,
}

impl PostDraft {
    pub fn text_only(text: impl Into<String>) -> Self {
        PostDraft {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(text: impl Into<String>, image: ImageAttachment) -> Self {
        PostDraft {
            text: text.into(),
            image: Some(image),
        }
    }

    /// A draft is publishable if it has any text or an attachment.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.image.is_none()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.image = None;
    }
}
