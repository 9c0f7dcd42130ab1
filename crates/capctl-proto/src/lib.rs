/// Protocol definitions for the mock capability service.
///
/// The message types mirror `mockcapability.v1` and the client speaks the
/// same method paths, so any server exposing that service can be driven by
/// the controller in `capctl-connect`.
pub mod mockcapability {
    pub mod v1 {
        pub mod client;
        pub mod messages;

        pub use client::MockCapabilityClient;
        pub use messages::*;
    }
}

// Re-export commonly used types for convenience
pub use mockcapability::v1::*;
