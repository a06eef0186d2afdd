// Lucid terminal library - exposes all core modules for testing

pub mod app;
pub mod awareness;
pub mod command;
pub mod config;
pub mod effects;
pub mod games;
pub mod interpreter;
pub mod logs;
pub mod modes;
pub mod output;
pub mod proc_table;
pub mod session;
pub mod time_source;
pub mod ui;
