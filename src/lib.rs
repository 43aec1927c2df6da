#![forbid(unsafe_code)]

pub mod cli;
pub mod content;
pub mod currency;
pub mod db;
pub mod gallery;
pub mod http;
pub mod inquiry;
pub mod logging;
pub mod memories;
pub mod resolve;
pub mod reviews;
pub mod upload;
pub mod weather;
