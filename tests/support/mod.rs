#![allow(dead_code)]

pub mod socket_guard;

/// Host (with port) of a mock server, usable as a domain to resolve.
#[must_use]
pub fn mock_host(server: &wiremock::MockServer) -> String {
    server.address().to_string()
}
