#![deny(warnings)]

pub mod config;
pub mod emotion;
pub mod pipeline;
pub mod tts;
pub mod util;
pub mod voice;
