//! Pipeline tests run against in-process fakes.
