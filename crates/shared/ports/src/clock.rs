use plutus_core::Timestamp;

/// Time source port.
///
/// Every timestamp the stores persist comes through one of these, so tests
/// can pin time and make staleness bounds reproducible.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Identifier for logging
    fn name(&self) -> &str {
        "Clock"
    }
}
