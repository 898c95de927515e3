pub mod relay;
pub mod streamer;
