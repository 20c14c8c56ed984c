/// Bookmark image region (`w:bookmarkStart` naming an image field).
use smallvec::SmallVec;

/// A bookmark whose span marks an image placeholder.
#[derive(Debug, Clone)]
pub struct BookmarkImageRegion {
    bookmark_name: String,
    image_field_name: String,
    blip_ids: SmallVec<[String; 1]>,
}

impl BookmarkImageRegion {
    pub fn new(bookmark_name: String, image_field_name: String) -> Self {
        Self {
            bookmark_name,
            image_field_name,
            blip_ids: SmallVec::new(),
        }
    }

    #[inline]
    pub fn bookmark_name(&self) -> &str {
        &self.bookmark_name
    }

    #[inline]
    pub fn image_field_name(&self) -> &str {
        &self.image_field_name
    }

    /// `r:embed` ids of the pictures found inside the bookmark span.
    #[inline]
    pub fn blip_ids(&self) -> &[String] {
        &self.blip_ids
    }

    pub(crate) fn add_blip(&mut self, embed_id: String) {
        self.blip_ids.push(embed_id);
    }
}
