use super::*;

fn text(content: &str) -> Span {
    Span::new_text(content)
}

fn strong(children: Vec<Span>) -> Span {
    Span::new_format(FormatKind::Strong, children)
}

fn emphasis(children: Vec<Span>) -> Span {
    Span::new_format(FormatKind::Emphasis, children)
}

fn vector(path: &[usize], index: usize) -> DocumentVector {
    DocumentVector::new(path.to_vec(), index)
}

/// `ab` `**cd *ef***` `g` / `hi`
fn nested_document() -> Document {
    Document::from_paragraphs(vec![
        Paragraph::new(vec![
            text("ab"),
            strong(vec![text("cd"), emphasis(vec![text("ef")])]),
            text("g"),
        ]),
        Paragraph::new(vec![text("hi")]),
    ])
    .unwrap()
}

#[test]
fn resolve_node_walks_into_formats() {
    let document = nested_document();
    match document.resolve_node(&[0, 1]).unwrap() {
        NodeRef::Span(Span::Format { kind, children }) => {
            assert_eq!(*kind, FormatKind::Strong);
            assert_eq!(children.len(), 2);
        }
        other => panic!("unexpected node {other:?}"),
    }
    assert!(matches!(
        document.resolve_node(&[1]).unwrap(),
        NodeRef::Paragraph(_)
    ));
    assert_eq!(document.resolve_text(&vector(&[0, 1, 1, 0], 0)).unwrap(), "ef");
}

#[test]
fn resolve_rejects_bad_paths() {
    let document = nested_document();
    assert!(matches!(
        document.resolve_node(&[]),
        Err(EditError::PathResolution { .. })
    ));
    assert!(matches!(
        document.resolve_node(&[5]),
        Err(EditError::PathResolution { .. })
    ));
    assert!(matches!(
        document.resolve_node(&[0, 0, 3]),
        Err(EditError::PathResolution { .. })
    ));
    assert!(matches!(
        document.resolve_node(&[0, 7]),
        Err(EditError::PathResolution { .. })
    ));
}

#[test]
fn resolve_text_reports_node_type() {
    let document = nested_document();
    assert_eq!(
        document.resolve_text(&vector(&[0, 1], 0)).unwrap_err(),
        EditError::NodeTypeMismatch {
            path: vec![0, 1],
            found: "format",
        }
    );
    assert_eq!(
        document.resolve_text(&vector(&[0], 0)).unwrap_err(),
        EditError::NodeTypeMismatch {
            path: vec![0],
            found: "paragraph",
        }
    );
}

#[test]
fn next_vector_steps_inside_leaf() {
    let document = nested_document();
    assert_eq!(
        document.next_vector(&vector(&[0, 0], 1)).unwrap(),
        vector(&[0, 0], 2)
    );
}

#[test]
fn next_vector_skips_shared_boundary_between_leaves() {
    let document = nested_document();
    assert_eq!(
        document.next_vector(&vector(&[0, 0], 2)).unwrap(),
        vector(&[0, 1, 0], 1)
    );
    assert_eq!(
        document.next_vector(&vector(&[0, 1, 1, 0], 2)).unwrap(),
        vector(&[0, 2], 1)
    );
}

#[test]
fn next_vector_enters_next_paragraph_at_zero() {
    let document = nested_document();
    assert_eq!(
        document.next_vector(&vector(&[0, 2], 1)).unwrap(),
        vector(&[1, 0], 0)
    );
}

#[test]
fn next_vector_at_document_end_is_boundary() {
    let document = nested_document();
    let end = vector(&[1, 0], 2);
    assert_eq!(
        document.next_vector(&end).unwrap_err(),
        EditError::Boundary {
            direction: Direction::Forward,
            vector: end,
        }
    );
}

#[test]
fn previous_vector_leaves_paragraph_for_previous_trailing() {
    let document = nested_document();
    assert_eq!(
        document.previous_vector(&vector(&[1, 0], 0)).unwrap(),
        vector(&[0, 2], 1)
    );
}

#[test]
fn previous_vector_stops_at_one_in_non_leading_leaf() {
    let document = nested_document();
    assert_eq!(
        document.previous_vector(&vector(&[0, 2], 1)).unwrap(),
        vector(&[0, 1, 1, 0], 2)
    );
    assert_eq!(
        document.previous_vector(&vector(&[0, 1, 0], 1)).unwrap(),
        vector(&[0, 0], 2)
    );
}

#[test]
fn previous_vector_at_document_start_is_boundary() {
    let document = nested_document();
    let err = document.previous_vector(&vector(&[0, 0], 0)).unwrap_err();
    assert!(err.is_boundary());
}

#[test]
fn navigation_checks_index_range() {
    let document = nested_document();
    assert_eq!(
        document.next_vector(&vector(&[0, 0], 5)).unwrap_err(),
        EditError::IndexOutOfRange {
            path: vec![0, 0],
            index: 5,
            min: 0,
            max: 2,
        }
    );
}

#[test]
fn walking_forward_visits_every_caret_position_once() {
    let document = nested_document();
    let mut positions = vec![document.document_start().unwrap()];
    loop {
        match document.next_vector(positions.last().unwrap()) {
            Ok(next) => positions.push(next),
            Err(err) => {
                assert!(err.is_boundary());
                break;
            }
        }
    }

    // 7 characters in the first paragraph, 2 in the second
    assert_eq!(positions.len(), 8 + 3);
    assert_eq!(positions.last(), Some(&document.document_end().unwrap()));
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

    for pair in positions.windows(2) {
        assert_eq!(document.previous_vector(&pair[1]).unwrap(), pair[0]);
    }
}

#[test]
fn leading_and_trailing_vectors() {
    let document = nested_document();
    assert_eq!(document.leading_vector(&[0]).unwrap(), vector(&[0, 0], 0));
    assert_eq!(document.trailing_vector(&[0]).unwrap(), vector(&[0, 2], 1));
    assert_eq!(
        document.leading_vector(&[0, 1]).unwrap(),
        vector(&[0, 1, 0], 0)
    );
    assert_eq!(
        document.trailing_vector(&[0, 1]).unwrap(),
        vector(&[0, 1, 1, 0], 2)
    );
    assert_eq!(document.document_start().unwrap(), vector(&[0, 0], 0));
    assert_eq!(document.document_end().unwrap(), vector(&[1, 0], 2));
}

#[test]
fn selection_points_snap_to_leaves() {
    let document = nested_document();
    assert_eq!(
        document.resolve_selection_point(&[0, 0], 1).unwrap(),
        vector(&[0, 0], 1)
    );
    assert_eq!(
        document.resolve_selection_point(&[0], 1).unwrap(),
        vector(&[0, 1, 0], 0)
    );
    assert_eq!(
        document.resolve_selection_point(&[0], 9).unwrap(),
        vector(&[0, 2], 1)
    );
    assert_eq!(
        document.resolve_selection_point(&[], 1).unwrap(),
        vector(&[1, 0], 0)
    );
    assert_eq!(
        document.resolve_selection_point(&[], 4).unwrap(),
        vector(&[1, 0], 2)
    );
    assert!(matches!(
        document.resolve_selection_point(&[0, 0], 3),
        Err(EditError::IndexOutOfRange { .. })
    ));
}

#[test]
fn leading_path_means_first_leaf() {
    assert!(is_leading_path(&[2]));
    assert!(is_leading_path(&[3, 0, 0]));
    assert!(!is_leading_path(&[0, 1, 0]));
}

#[test]
fn indices_count_characters() {
    let document = Document::from_paragraphs(vec![Paragraph::new(vec![text("héllo")])]).unwrap();
    assert_eq!(
        document.next_vector(&vector(&[0, 0], 4)).unwrap(),
        vector(&[0, 0], 5)
    );
    assert!(document.next_vector(&vector(&[0, 0], 5)).unwrap_err().is_boundary());
}
