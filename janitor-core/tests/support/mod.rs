//! Shared fakes and fixtures for janitor-core integration tests.

#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;
