pub mod export;
pub mod list;
pub mod serve;
pub mod show;
mod source;
