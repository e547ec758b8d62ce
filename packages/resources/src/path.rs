use std::path::{Path, PathBuf};

use crate::resource::Owner;

/// Storage location of a resource: `{root}/{model}/{id}/{attribute}/{name}`.
///
/// Two resources with the same owner slot and name map to the same file.
pub fn derive_path(root: &Path, owner: &Owner, name: &str) -> PathBuf {
    owner_dir(root, owner).join(name)
}

/// Directory holding every file of one owner slot.
pub fn owner_dir(root: &Path, owner: &Owner) -> PathBuf {
    root.join(&owner.model)
        .join(owner.id.to_string())
        .join(&owner.attribute)
}

/// Reason a string cannot be used as one path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentError {
    /// Segment is empty or whitespace-only.
    Empty,
    /// Segment contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Segment is `..` (or `.`).
    PathTraversal,
    /// Segment contains null bytes.
    NullByte,
    /// Top-level segment starts with a dot.
    Hidden,
    /// Segment contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl SegmentError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "must not be empty",
            Self::ContainsPathSeparator => "path separators are not allowed",
            Self::PathTraversal => "'.' and '..' are not allowed",
            Self::NullByte => "null bytes are not allowed",
            Self::Hidden => "names starting with '.' are not allowed",
            Self::ControlCharacter => "control characters are not allowed",
        }
    }
}

/// Validates a string used as a single directory or file name in the layout.
pub fn validate_segment(segment: &str) -> Result<&str, SegmentError> {
    if segment.trim().is_empty() {
        return Err(SegmentError::Empty);
    }

    if segment.contains('\0') {
        return Err(SegmentError::NullByte);
    }

    if segment.chars().any(|c| c.is_ascii_control()) {
        return Err(SegmentError::ControlCharacter);
    }

    if segment.contains('/') || segment.contains('\\') {
        return Err(SegmentError::ContainsPathSeparator);
    }

    if segment == ".." || segment == "." {
        return Err(SegmentError::PathTraversal);
    }

    Ok(segment)
}

/// [`validate_segment`] for the segment placed directly under the root.
///
/// Dot-names are refused there so the storage's own `.tmp` stays out of reach.
pub fn validate_top_segment(segment: &str) -> Result<&str, SegmentError> {
    let segment = validate_segment(segment)?;
    if segment.starts_with('.') {
        return Err(SegmentError::Hidden);
    }
    Ok(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(model: &str, id: i32, attribute: &str) -> Owner {
        Owner::new(model, id, attribute)
    }

    #[test]
    fn derive_path_follows_owner_layout() {
        let root = Path::new("/srv/resources");
        let path = derive_path(root, &owner("User", 42, "avatar"), "pic.png");
        assert_eq!(path, PathBuf::from("/srv/resources/User/42/avatar/pic.png"));
    }

    #[test]
    fn derive_path_is_idempotent() {
        let root = Path::new("data");
        let o = owner("Post", 7, "attachments");
        assert_eq!(
            derive_path(root, &o, "report.pdf"),
            derive_path(root, &o, "report.pdf")
        );
    }

    #[test]
    fn derive_path_collides_for_same_slot_and_name() {
        let root = Path::new("data");
        let a = derive_path(root, &owner("User", 1, "avatar"), "me.png");
        let b = derive_path(root, &owner("User", 1, "avatar"), "me.png");
        let c = derive_path(root, &owner("User", 2, "avatar"), "me.png");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn owner_dir_is_parent_of_derived_path() {
        let root = Path::new("data");
        let o = owner("User", 3, "cv");
        let path = derive_path(root, &o, "cv.pdf");
        assert_eq!(path.parent(), Some(owner_dir(root, &o).as_path()));
    }

    #[test]
    fn validate_segment_accepts_valid_names() {
        assert!(validate_segment("pic.png").is_ok());
        assert!(validate_segment("User").is_ok());
        assert!(validate_segment("my report (final).pdf").is_ok());
        assert!(validate_segment("archive..tar.gz").is_ok());
    }

    #[test]
    fn validate_segment_rejects_empty() {
        assert_eq!(validate_segment(""), Err(SegmentError::Empty));
        assert_eq!(validate_segment("   "), Err(SegmentError::Empty));
    }

    #[test]
    fn validate_segment_rejects_separators() {
        assert_eq!(
            validate_segment("a/b"),
            Err(SegmentError::ContainsPathSeparator)
        );
        assert_eq!(
            validate_segment("a\\b"),
            Err(SegmentError::ContainsPathSeparator)
        );
    }

    #[test]
    fn validate_segment_rejects_traversal() {
        assert_eq!(validate_segment(".."), Err(SegmentError::PathTraversal));
        assert_eq!(validate_segment("."), Err(SegmentError::PathTraversal));
    }

    #[test]
    fn dot_names_only_refused_at_top_level() {
        assert_eq!(validate_segment(".env"), Ok(".env"));
        assert_eq!(validate_segment(".gitignore"), Ok(".gitignore"));
        assert_eq!(validate_top_segment(".tmp"), Err(SegmentError::Hidden));
        assert_eq!(validate_top_segment(".."), Err(SegmentError::PathTraversal));
        assert_eq!(validate_top_segment("User"), Ok("User"));
    }

    #[test]
    fn validate_segment_rejects_control_characters() {
        assert_eq!(validate_segment("a\0b"), Err(SegmentError::NullByte));
        assert_eq!(
            validate_segment("file\r\nname"),
            Err(SegmentError::ControlCharacter)
        );
    }
}
