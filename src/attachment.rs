use std::path::Path;

use teloxide::types::Message;

pub const DEFAULT_FILE_NAME: &str = "video.mp4";
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Remote file handle plus the name the sender gave it
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentRef {
    pub file_id: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    Video(AttachmentRef),
    Document(AttachmentRef),
    Neither,
}

impl Attachment {
    /// A video takes precedence over a document.
    pub fn from_message(msg: &Message) -> Self {
        if let Some(video) = msg.video() {
            Attachment::Video(AttachmentRef {
                file_id: video.file.id.clone(),
                file_name: video.file_name.clone(),
            })
        } else if let Some(document) = msg.document() {
            Attachment::Document(AttachmentRef {
                file_id: document.file.id.clone(),
                file_name: document.file_name.clone(),
            })
        } else {
            Attachment::Neither
        }
    }

    pub fn into_ref(self) -> Option<AttachmentRef> {
        match self {
            Attachment::Video(r) | Attachment::Document(r) => Some(r),
            Attachment::Neither => None,
        }
    }
}

/// Name used for both temp files and the uploaded note.
///
/// Only the final path component of the given name is kept. An empty name becomes
/// `video.mp4`, a name without an extension gets `.mp4` appended.
pub fn normalize_file_name(file_name: Option<&str>) -> String {
    let name = file_name
        .and_then(|n| Path::new(n.trim()).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty());

    match name {
        None => DEFAULT_FILE_NAME.to_string(),
        // Anything after a dot counts as an extension, `.mp4` included.
        Some(n) if !n.contains('.') => format!("{n}.{DEFAULT_EXTENSION}"),
        Some(n) => n.to_string(),
    }
}
