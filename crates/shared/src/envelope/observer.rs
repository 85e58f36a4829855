use super::Envelope;

/// Hooks invoked while an envelope is sealed.
///
/// Always called; implementations decide what to record.
pub trait SealObserver: Send + Sync {
    fn recipient_wrapped(&self, _address: &str) {}

    fn recipient_failed(&self, _address: &str, _reason: &str) {}

    fn recipient_skipped(&self, _address: &str) {}

    fn envelope_sealed(&self, _envelope: &Envelope) {}
}

/// Observer that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SealObserver for NoopObserver {}
