pub const SEND_VIDEO: &str = "Please send a video file to make it circular.";
pub const INVALID_VIDEO: &str = "Please send a valid video file.";
pub const PROCESS_FAILED: &str = "Failed to process the video. Please try again.";
pub const DOWNLOAD_FAILED: &str = "Failed to download the video. Please try again.";
pub const SEND_FAILED: &str = "Failed to send the processed video. Please try again.";
pub const VIDEO_NOTES_FORBIDDEN: &str = "It seems that I don't have permission to send video notes. \
    Please check if you allow sending voice messages in the settings.";

pub const DOWNLOADED: &str = "Video downloaded. Processing...";
pub const PROCESSED: &str = "Video processed. Sending...";
