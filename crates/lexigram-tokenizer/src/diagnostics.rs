//! [`RunDiagnostics`]: the per-run counters a typed tokenization pass
//! accumulates, surfaced as a single structured `tracing::info!` event rather
//! than the host's ad hoc `print()` calls.

/// Counters accumulated while tokenizing one or more files. Only the typed
/// variant increments `type_inferred_call_tokens`/`annotated_assigns`; the
/// untyped variant still counts total calls and total assigns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunDiagnostics {
    pub total_call_tokens: u64,
    pub type_inferred_call_tokens: u64,
    pub total_assigns: u64,
    pub annotated_assigns: u64,
}

impl RunDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: Self) {
        self.total_call_tokens += other.total_call_tokens;
        self.type_inferred_call_tokens += other.type_inferred_call_tokens;
        self.total_assigns += other.total_assigns;
        self.annotated_assigns += other.annotated_assigns;
    }

    /// Emits the accumulated counters as one structured logging event.
    pub fn report(&self) {
        tracing::info!(
            total_call_tokens = self.total_call_tokens,
            type_inferred_call_tokens = self.type_inferred_call_tokens,
            total_assigns = self.total_assigns,
            annotated_assigns = self.annotated_assigns,
            "tokenization diagnostics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_every_counter() {
        let mut a = RunDiagnostics {
            total_call_tokens: 1,
            type_inferred_call_tokens: 1,
            total_assigns: 2,
            annotated_assigns: 1,
        };
        let b = RunDiagnostics {
            total_call_tokens: 3,
            type_inferred_call_tokens: 0,
            total_assigns: 1,
            annotated_assigns: 1,
        };
        a.merge(b);
        assert_eq!(
            a,
            RunDiagnostics {
                total_call_tokens: 4,
                type_inferred_call_tokens: 1,
                total_assigns: 3,
                annotated_assigns: 2,
            }
        );
    }
}
