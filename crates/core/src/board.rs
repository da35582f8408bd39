//! Board reconciliation against an authoritative snapshot.

use crate::session::BoardView;
use crate::types::{BoardState, Mark, BOARD_CELLS};

/// Bring `shown` (what the view currently displays) in line with `target`,
/// telling `view` about every change.
///
/// Only cells that differ are touched. A cell never jumps from one mark to
/// another: it is cleared first, then marked. Returns the number of view
/// events emitted, so reconciling a matching board returns 0.
pub fn reconcile<V: BoardView + ?Sized>(
    shown: &mut BoardState,
    target: &BoardState,
    view: &mut V,
) -> usize {
    let mut events = 0;
    for index in 0..BOARD_CELLS {
        let (Some(have), Some(want)) = (shown.get(index), target.get(index)) else {
            continue;
        };
        if have == want {
            continue;
        }

        if !have.is_empty() {
            view.cell_cleared(index);
            shown.set(index, Mark::Empty);
            events += 1;
        }
        if let Some(role) = want.role() {
            view.cell_marked(index, role);
            shown.set(index, want);
            events += 1;
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl BoardView for Log {
        fn cell_marked(&mut self, index: usize, role: Role) {
            self.0.push(format!("mark {} {}", index, role));
        }
        fn cell_cleared(&mut self, index: usize) {
            self.0.push(format!("clear {}", index));
        }
        fn result_announced(&mut self, text: &str) {
            self.0.push(format!("result {}", text));
        }
    }

    #[test]
    fn test_reconcile_matching_board_is_silent() {
        let mut shown = BoardState::new();
        shown.set(0, Mark::X);
        shown.set(4, Mark::O);
        let target = shown;
        let mut log = Log::default();

        assert_eq!(reconcile(&mut shown, &target, &mut log), 0);
        assert!(log.0.is_empty());
    }

    #[test]
    fn test_reconcile_marks_and_clears() {
        let mut shown = BoardState::new();
        shown.set(2, Mark::X);
        let mut target = BoardState::new();
        target.set(4, Mark::O);
        let mut log = Log::default();

        assert_eq!(reconcile(&mut shown, &target, &mut log), 2);
        assert_eq!(log.0, vec!["clear 2", "mark 4 O"]);
        assert_eq!(shown, target);
    }

    #[test]
    fn test_reconcile_passes_through_empty() {
        let mut shown = BoardState::new();
        shown.set(7, Mark::X);
        let mut target = BoardState::new();
        target.set(7, Mark::O);
        let mut log = Log::default();

        reconcile(&mut shown, &target, &mut log);
        assert_eq!(log.0, vec!["clear 7", "mark 7 O"]);
    }
}
