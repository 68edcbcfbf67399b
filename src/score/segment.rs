use crate::reader::{ElementKind, RawElement};

const MEASURE_TAG: &str = "measure";

/// The elements of one measure, tagged with its 1-based position in the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureSlice<'a> {
    pub number: usize,
    pub elements: &'a [RawElement],
}

/// Split the element list at every `</measure>`.
///
/// The measure's own open tag is part of its slice, the close tag is not.
/// A measure written (or normalized) as `<measure/>` is a complete, empty
/// measure. Anything accumulated after the final close never forms a measure.
pub fn segment_measures(elements: &[RawElement]) -> Vec<MeasureSlice<'_>> {
    let mut slices = Vec::new();
    let mut slice_start = 0;

    for (index, element) in elements.iter().enumerate() {
        let slice_end = match element.kind {
            _ if element.tag != MEASURE_TAG => continue,
            ElementKind::Close => index,
            ElementKind::OpenClose => index + 1,
            ElementKind::Open => continue,
        };
        slices.push(MeasureSlice {
            number: slices.len() + 1,
            elements: &elements[slice_start..slice_end],
        });
        slice_start = index + 1;
    }

    if slice_start < elements.len() {
        log::debug!(
            "ignoring {} trailing elements after the last measure",
            elements.len() - slice_start
        );
    }

    slices
}

/// `(open, close)` counts of measure markers, for checking document balance.
/// A self-closing measure counts as both.
pub fn count_measure_markers(elements: &[RawElement]) -> (usize, usize) {
    elements
        .iter()
        .filter(|e| e.tag == MEASURE_TAG)
        .fold((0, 0), |(open, close), e| match e.kind {
            ElementKind::Open => (open + 1, close),
            ElementKind::Close => (open, close + 1),
            ElementKind::OpenClose => (open + 1, close + 1),
        })
}
