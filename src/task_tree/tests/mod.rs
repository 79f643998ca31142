//! Unit tests for the task tree module.

mod service_tests;
