// src/lib.rs

pub mod audit;
pub mod config;
pub mod error;
pub mod exam;
pub mod llm;
pub mod speech;
pub mod store;
pub mod web;
