//! Tests run against a deployed bookstore service, see the `system_tests` and `load_tests` features
