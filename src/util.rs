//! Small shared primitives: balanced list splitting used by both leaf and
//! interior node splits, and the overflow chain's length-prefix framing.

/// Split a list in two. For an odd-length input, the median element lands
/// in the right half — matching `dbstuff/util.py::split_list`.
///
/// ```text
/// split_list([1, 2, 3, 4])    == ([1, 2], [3, 4])
/// split_list([1, 2, 3, 4, 5]) == ([1, 2], [3, 4, 5])
/// ```
pub fn split_list<T>(mut xs: Vec<T>) -> (Vec<T>, Vec<T>) {
    let mid = xs.len() / 2;
    let right = xs.split_off(mid);
    (xs, right)
}

/// Prefix `data` with its length as a 4-byte big-endian unsigned integer.
pub fn length_prefix(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(data);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_even() {
        let (l, r) = split_list(vec![1, 2, 3, 4]);
        assert_eq!(l, vec![1, 2]);
        assert_eq!(r, vec![3, 4]);
    }

    #[test]
    fn split_list_odd_puts_median_right() {
        let (l, r) = split_list(vec![1, 2, 3, 4, 5]);
        assert_eq!(l, vec![1, 2]);
        assert_eq!(r, vec![3, 4, 5]);
    }

    #[test]
    fn length_prefix_round_trip() {
        let framed = length_prefix(b"hello");
        assert_eq!(&framed[0..4], &5u32.to_be_bytes());
        assert_eq!(&framed[4..], b"hello");
    }
}
