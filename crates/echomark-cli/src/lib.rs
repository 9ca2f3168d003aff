//! Echomark CLI - front end for the duplicate-detection engine

pub mod logging;
pub mod output;
