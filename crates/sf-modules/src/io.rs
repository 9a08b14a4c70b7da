//! Helpers for reading input slots and writing output slots.

use sf_core::Signal;

static INVALID: Signal = Signal::Invalid;

/// Input `index`, with absent or out-of-range slots read as invalid.
pub fn input(input: &[Option<Signal>], index: usize) -> &Signal {
    input.get(index).and_then(Option::as_ref).unwrap_or(&INVALID)
}

/// Numeric view of input `index`, NaN when it has no value.
pub fn value_or_nan(input: &[Option<Signal>], index: usize) -> f64 {
    self::input(input, index).value().unwrap_or(f64::NAN)
}

/// Write output `index`; indices past the end of `output` are unconnected
/// and ignored.
pub fn emit(output: &mut [Option<Signal>], index: usize, signal: impl Into<Signal>) {
    if let Some(slot) = output.get_mut(index) {
        *slot = Some(signal.into());
    }
}

/// Whether every input slot holds a valid signal.
pub fn all_valid(input: &[Option<Signal>]) -> bool {
    input.iter().all(|s| s.as_ref().is_some_and(Signal::is_valid))
}

/// Bit `i` is set when input `i` holds a valid signal (first 32 inputs).
pub fn validity_mask(input: &[Option<Signal>]) -> u32 {
    input
        .iter()
        .take(32)
        .enumerate()
        .filter(|(_, s)| s.as_ref().is_some_and(Signal::is_valid))
        .fold(0, |mask, (i, _)| mask | (1 << i))
}
