//! Unique feature paths for path-dependent TreeSHAP.
//!
//! A path records, for each distinct feature split on between the root and
//! the current node, the fraction of "zero" (feature absent) and "one"
//! (feature present) paths flowing through, plus the permutation weights.

/// One element of a unique feature path.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PathItem {
    /// Feature split on; `None` for the root sentinel.
    pub feature: Option<usize>,
    pub zero_fraction: f32,
    pub one_fraction: f32,
    pub pweight: f32,
}

/// Path buffer length needed for a tree of depth `max_depth`.
///
/// Every recursion level stores its own copy of the path in one flat buffer.
pub(crate) fn buffer_len(max_depth: usize) -> usize {
    let depth = max_depth + 2;
    depth * (depth + 1) / 2
}

/// Append a feature to the path, updating the permutation weights.
pub(crate) fn extend(
    path: &mut [PathItem],
    unique_depth: usize,
    zero_fraction: f32,
    one_fraction: f32,
    feature: Option<usize>,
) {
    path[unique_depth] = PathItem {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if unique_depth == 0 { 1.0 } else { 0.0 },
    };

    let denom = (unique_depth + 1) as f32;
    for i in (0..unique_depth).rev() {
        path[i + 1].pweight += one_fraction * path[i].pweight * (i + 1) as f32 / denom;
        path[i].pweight = zero_fraction * path[i].pweight * (unique_depth - i) as f32 / denom;
    }
}

/// Remove the element at `index` from the path, undoing [`extend`].
pub(crate) fn unwind(path: &mut [PathItem], unique_depth: usize, index: usize) {
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let depth = (unique_depth + 1) as f32;
    let mut next_one_portion = path[unique_depth].pweight;

    for i in (0..unique_depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * depth / ((i + 1) as f32 * one_fraction);
            next_one_portion =
                tmp - path[i].pweight * zero_fraction * (unique_depth - i) as f32 / depth;
        } else {
            path[i].pweight = path[i].pweight * depth / (zero_fraction * (unique_depth - i) as f32);
        }
    }

    for i in index..unique_depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
}

/// Total permutation weight the path would have with `index` removed.
pub(crate) fn unwound_sum(path: &[PathItem], unique_depth: usize, index: usize) -> f32 {
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let depth = (unique_depth + 1) as f32;
    let mut next_one_portion = path[unique_depth].pweight;
    let mut total = 0.0;

    for i in (0..unique_depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next_one_portion * depth / ((i + 1) as f32 * one_fraction);
            total += tmp;
            next_one_portion =
                path[i].pweight - tmp * zero_fraction * ((unique_depth - i) as f32 / depth);
        } else {
            total += path[i].pweight / zero_fraction / ((unique_depth - i) as f32 / depth);
        }
    }

    total
}
