use htmlpad_markup::{MatchOutcome, PairSide, TagIndex};

#[test]
fn paragraph_inside_div_pairs_with_its_own_closer() {
    let index = TagIndex::build("<div><p>Hello</p></div>");
    let outcome = index.match_at(6);
    let pair = outcome.pair().expect("p should be paired");
    assert_eq!(pair.opening.name, "p");
    assert_eq!(pair.opening.span(), 5..8);
    assert_eq!(pair.closing.span(), 13..17);
    assert_eq!(outcome.highlight_ranges(), vec![5..8, 13..17]);
}

#[test]
fn caret_right_after_div_resolves_to_div() {
    let index = TagIndex::build("<div><p>Hello</p></div>");
    let outcome = index.match_at(5);
    let pair = outcome.pair().expect("div should be paired");
    assert_eq!(pair.name(), "div");
    assert_eq!(pair.closing.span(), 17..23);
}

#[test]
fn first_list_item_does_not_pair_with_second() {
    let index = TagIndex::build("<ul><li>A</li><li>B</li></ul>");
    let pair = index.match_at(6).pair().expect("li pair");
    assert_eq!(pair.opening.span(), 4..8);
    assert_eq!(pair.closing.span(), 9..14);
}

#[test]
fn closing_tag_resolves_backwards() {
    let index = TagIndex::build("<ul><li>A</li><li>B</li></ul>");
    let outcome = index.match_at(26);
    match outcome {
        MatchOutcome::Paired { pair, anchor } => {
            assert_eq!(anchor, PairSide::Closing);
            assert_eq!(pair.opening.span(), 0..4);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(outcome.partner().map(|t| t.start_offset), Some(0));
}

#[test]
fn self_closing_and_bare_void_tags_have_no_partner() {
    let index = TagIndex::build(r#"<p>a<br>b<img src="x"/></p>"#);
    assert!(matches!(index.match_at(5), MatchOutcome::Unmatched(t) if t.name == "br"));
    assert!(matches!(index.match_at(12), MatchOutcome::SelfClosing(t) if t.name == "img"));
    assert_eq!(index.match_at(5).partner(), None);
    assert_eq!(index.match_at(12).partner(), None);
}

#[test]
fn text_between_tags_has_no_tag() {
    let index = TagIndex::build("<b>plain text</b>");
    assert_eq!(index.match_at(8), MatchOutcome::NoTagAtCursor);
    assert!(index.match_at(8).highlight_ranges().is_empty());
    assert_eq!(TagIndex::build("").match_at(0), MatchOutcome::NoTagAtCursor);
}

#[test]
fn every_tag_in_well_formed_fragment_is_paired() {
    let source = "<html><body><section><div><div><span>x</span></div>\
                  <ul><li><a href=\"#\">y</a></li><li>z</li></ul></div></section></body></html>";
    let index = TagIndex::build(source);
    assert!(index.validate().is_ok());
    for (position, token) in index.tokens().iter().enumerate() {
        let partner = index
            .partner_of(position)
            .unwrap_or_else(|| panic!("{} at {} is orphaned", token.raw_text, token.start_offset));
        let other = index.get(partner).expect("partner index");
        assert_eq!(other.name, token.name);
        assert_ne!(other.is_closing, token.is_closing);
        assert_eq!(index.partner_of(partner), Some(position));
    }
}

#[test]
fn matching_is_idempotent() {
    let index = TagIndex::build("<div><div></div></div>");
    let first = index.match_at(2);
    let second = index.match_at(2);
    assert_eq!(first, second);
    assert_eq!(index.len(), 4);
}
