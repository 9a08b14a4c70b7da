//! The per-scan signal exchange buffer.

use sf_core::Signal;

/// One slot per connection, indexed by buffer pointer.
///
/// Slots are `None` ("absent") until written in the current scan. Reads go
/// through an internal scratch vector that is reused from call to call, so
/// a steady-state scan does not allocate.
///
/// Map entries below zero mean "unconnected". A non-negative entry past the
/// end of the buffer is a map construction bug and panics.
#[derive(Debug, Clone, Default)]
pub struct DataBuffer {
    slots: Vec<Option<Signal>>,
    scratch: Vec<Option<Signal>>,
}

impl DataBuffer {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
            scratch: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Reset every slot to absent.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Gather the slots named by `map`. The returned slice is exactly
    /// `map.len()` long; unconnected entries read as `None`.
    pub fn get(&mut self, map: &[i32]) -> &[Option<Signal>] {
        self.scratch.clear();
        for &pointer in map {
            let signal = match usize::try_from(pointer) {
                Ok(p) => self.slots[p].clone(),
                Err(_) => None,
            };
            self.scratch.push(signal);
        }
        &self.scratch
    }

    /// Scatter `signals[i]` into slot `map[i]` for every connected entry.
    pub fn put(&mut self, signals: &[Option<Signal>], map: &[i32]) {
        for (signal, &pointer) in signals.iter().zip(map) {
            if let Ok(p) = usize::try_from(pointer) {
                self.slots[p] = signal.clone();
            }
        }
    }

    pub fn slot(&self, pointer: usize) -> Option<&Signal> {
        self.slots.get(pointer).and_then(Option::as_ref)
    }

    pub fn slots(&self) -> &[Option<Signal>] {
        &self.slots
    }

    /// `i: value` per slot, absent slots shown as `-`.
    pub fn dump_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.slots.iter().enumerate().map(|(i, s)| match s {
            Some(signal) => format!("{i}: {signal}"),
            None => format!("{i}: -"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_maps_pointers_and_marks_unconnected() {
        let mut b = DataBuffer::new(3);
        b.put(
            &[Some(Signal::scalar(1.0)), Some(Signal::boolean(true))],
            &[2, 0],
        );
        let got = b.get(&[0, -1, 2]);
        assert_eq!(
            got,
            &[Some(Signal::boolean(true)), None, Some(Signal::scalar(1.0))]
        );
    }

    #[test]
    fn put_skips_unconnected_outputs() {
        let mut b = DataBuffer::new(2);
        b.put(&[Some(Signal::scalar(7.0)), Some(Signal::scalar(8.0))], &[-1, 1]);
        assert_eq!(b.slot(0), None);
        assert_eq!(b.slot(1), Some(&Signal::scalar(8.0)));
    }

    #[test]
    fn clear_removes_stale_values() {
        let mut b = DataBuffer::new(2);
        b.put(&[Some(Signal::scalar(1.0))], &[0]);
        b.clear();
        b.put(&[Some(Signal::scalar(2.0))], &[1]);
        assert_eq!(b.get(&[0, 1]), &[None, Some(Signal::scalar(2.0))]);
    }

    #[test]
    fn scratch_length_follows_map() {
        let mut b = DataBuffer::new(4);
        assert_eq!(b.get(&[0, 1, 2, 3]).len(), 4);
        assert_eq!(b.get(&[3]).len(), 1);
        assert!(b.get(&[]).is_empty());
    }

    #[test]
    #[should_panic]
    fn out_of_range_pointer_panics() {
        let mut b = DataBuffer::new(1);
        b.put(&[Some(Signal::scalar(1.0))], &[1]);
    }

    #[test]
    fn dump_lines_show_every_slot() {
        let mut b = DataBuffer::new(2);
        b.put(&[Some(Signal::scalar(-5.0))], &[1]);
        let lines: Vec<String> = b.dump_lines().collect();
        assert_eq!(lines, ["0: -", "1: -5"]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn put_then_get_returns_written_values(
                values in prop::collection::vec(-1e6f64..1e6, 1..16),
            ) {
                let n = values.len();
                let signals: Vec<_> = values.iter().map(|v| Some(Signal::scalar(*v))).collect();
                // write in reverse slot order, read back in forward order
                let rev: Vec<i32> = (0..n as i32).rev().collect();
                let fwd: Vec<i32> = (0..n as i32).collect();
                let mut b = DataBuffer::new(n);
                b.put(&signals, &rev);
                let got = b.get(&fwd).to_vec();
                let expected: Vec<_> = signals.into_iter().rev().collect();
                prop_assert_eq!(got, expected);
            }

            #[test]
            fn unconnected_entries_read_absent(mask in prop::collection::vec(any::<bool>(), 0..16)) {
                let mut b = DataBuffer::new(mask.len());
                let all: Vec<i32> = (0..mask.len() as i32).collect();
                b.put(&vec![Some(Signal::boolean(true)); mask.len()], &all);
                let map: Vec<i32> = all
                    .iter()
                    .zip(&mask)
                    .map(|(p, keep)| if *keep { *p } else { -1 })
                    .collect();
                let got = b.get(&map);
                prop_assert_eq!(got.len(), mask.len());
                for (slot, keep) in got.iter().zip(&mask) {
                    prop_assert_eq!(slot.is_some(), *keep);
                }
            }
        }
    }
}
