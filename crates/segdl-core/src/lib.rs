pub mod config;
pub mod logging;

// Pipeline: id source -> fetchers -> ordered aggregator -> output file.
pub mod downloader;
pub mod resolver;
pub mod retry;
pub mod segment;
pub mod storage;
pub mod transport;
pub mod url_model;
