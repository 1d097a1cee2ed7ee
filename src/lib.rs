pub mod catalog;
pub mod db;
pub mod error;
pub mod grading;
pub mod ipc;
pub mod stores;
