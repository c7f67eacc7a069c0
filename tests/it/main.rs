#[path = "../../src/test_support.rs"]
mod test_support;

mod http_tests;
