pub mod challenge;
pub mod jwt;
pub mod message;
pub mod signature;

// Re-export main functions for easier access
pub use message::build_message;
pub use signature::verify_signature;
