pub mod transcode;

pub use transcode::{Ffmpeg, Transcoder};
