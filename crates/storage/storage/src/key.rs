use tansu_record::MediaId;

/// Object name for an original attachment: `"{id}.{extension}"`.
///
/// Both backends key physical objects this way, so the pair
/// `(id, extension)` deterministically addresses the original upload.
#[must_use]
pub fn attachment_object_name(id: MediaId, extension: &str) -> String {
    format!("{id}.{extension}")
}

/// Object name for a thumbnail: `"thumb-{id}.jpg"`.
///
/// Thumbnails are always JPEG regardless of the source format, so the id
/// alone addresses them. The `thumb-` prefix keeps the name disjoint from
/// [`attachment_object_name`] even when the original itself is a `.jpg`
/// upload; a bare `{id}.jpg` would collide with it.
#[must_use]
pub fn thumbnail_object_name(id: MediaId) -> String {
    format!("thumb-{id}.jpg")
}
