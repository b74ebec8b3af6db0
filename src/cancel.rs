/// A one-shot flag listeners trip to veto what comes next.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Canceller {
    cancelled: bool,
}

impl Canceller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Run `action` with a fresh flag and report whether it was tripped.
    pub fn chain(action: impl FnOnce(&mut Canceller)) -> bool {
        let mut canceller = Canceller::new();
        action(&mut canceller);
        canceller.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        assert!(!Canceller::new().is_cancelled());
    }

    #[test]
    fn cancel_sticks() {
        let mut c = Canceller::new();
        c.cancel();
        c.cancel();
        assert!(c.is_cancelled());
    }

    #[test]
    fn chain_reports_trip() {
        assert!(Canceller::chain(|c| c.cancel()));
        assert!(!Canceller::chain(|_| {}));
    }
}
