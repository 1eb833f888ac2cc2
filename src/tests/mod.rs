//! Fixture tests against published almanac values.
