/// Classification for fallback policy.
///
/// Used to determine how the resolver should respond to errors from
/// its sources.
///
/// # Behavior Summary
///
/// | Class | Same tier again? | What moves |
/// |-------|------------------|------------|
/// | `RotateCredential` | Yes | Next credential, same source |
/// | `RetryOnce` | Yes, once | Next credential, then the tier is abandoned |
/// | `NextSource` | Yes | Next source or recipe within the tier |
/// | `SkipTier` | No | Resolution falls through to the next tier |
/// | `Fatal` | No | Error surfaces to the embedder at startup |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Escalation {
    /// The current credential is throttled; another credential from
    /// the pool may still be under its quota. No penalty beyond the
    /// rotation itself.
    RotateCredential,

    /// Transient failure (timeout, upstream 5xx, transport error).
    ///
    /// The resolver allows exactly one more attempt with the next
    /// credential. A second transient failure abandons the tier: a
    /// source that fails twice in a row is treated as down for this
    /// resolution.
    RetryOnce,

    /// This source cannot serve the symbol (extraction mismatch,
    /// dead session) but a sibling source or recipe might.
    NextSource,

    /// The whole tier is unusable right now. Resolution continues at
    /// the next tier; the estimated tier always answers.
    SkipTier,

    /// Broken configuration. Surfaced from pipeline construction;
    /// resolution never produces this class.
    Fatal,
}
