//! Upstream credential-refresh protocol tests against a mock IdP and API.
