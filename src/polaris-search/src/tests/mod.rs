//! Scenario tests spanning several polaris-search modules.

mod support;

mod replace_tests;
