pub mod config;
pub mod detail;
pub mod format;
pub mod leetcode;
pub mod listing;
pub mod notebook;
pub mod session;
pub mod solution;
