pub mod moderation;
pub mod recorder;
