//! Integration tests for the lake commit log

mod cli_binary;
mod commit_log;
mod config_integration;
mod registry_concurrency;
mod resolver_head;
mod test_utils;
