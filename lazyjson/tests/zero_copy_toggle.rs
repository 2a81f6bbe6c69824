// SPDX-License-Identifier: Apache-2.0

// The zero-copy switch is process-wide, so it is exercised from a single test
// in its own binary.

use std::rc::Rc;

use lazyjson::{need_allocation, set_zero_copy, zero_copy_enabled, Input, PaddedView, Parser, Strategy, PADDING};
use test_log::test;

fn roomy_input() -> Vec<u8> {
    let mut vec = Vec::with_capacity(8192);
    vec.extend_from_slice(br#"{"zero": "copy"}"#);
    vec
}

#[test]
fn toggle_selects_the_strategy_for_the_next_preparation() {
    assert_eq!(zero_copy_enabled(), cfg!(feature = "zero-copy"));

    let input = roomy_input();
    let boundary_ok = !need_allocation(input.as_ptr() as usize, input.len(), input.capacity());

    set_zero_copy(true);
    let reused = PaddedView::prepare(input).unwrap();
    if boundary_ok {
        assert_eq!(reused.strategy(), Strategy::InPlace);
    } else {
        assert_eq!(reused.strategy(), Strategy::Grown);
    }

    set_zero_copy(false);
    assert!(!zero_copy_enabled());
    let grown = PaddedView::prepare(roomy_input()).unwrap();
    assert_eq!(grown.strategy(), Strategy::Grown);

    let frozen: Rc<[u8]> = Rc::from(&b"[1, 2, 3]"[..]);
    let copied = PaddedView::prepare(Input::from(frozen.clone())).unwrap();
    assert_eq!(copied.strategy(), Strategy::Copied);
    assert_eq!(Rc::strong_count(&frozen), 1);

    // Existing views keep their backing.
    assert_eq!(reused.as_bytes(), br#"{"zero": "copy"}"#);
    for view in [reused, grown, copied] {
        assert!(view.capacity() >= view.len() + PADDING);
        let parser = Parser::new();
        let mut doc = parser.iterate(view).unwrap();
        assert!(doc.value().is_ok());
    }

    set_zero_copy(true);
    assert!(zero_copy_enabled());
}
