pub mod activity;
pub mod photo;
pub mod ride;
