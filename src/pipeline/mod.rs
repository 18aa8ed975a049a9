pub mod assign;
pub mod batch;
pub mod downsample;
pub mod matcher;
pub mod metadata;
pub mod output;
pub mod parse;
pub mod process;
