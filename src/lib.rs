//! boong bootstrap library — exposes modules for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod agent;
pub mod cli;
pub mod command_runner;
pub mod config;
pub mod download;
pub mod git;
pub mod output;
pub mod paths;
pub mod provisioner;
pub mod symlink;
pub mod transfer;
