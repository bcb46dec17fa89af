//! Sets of code points accepted by the decoder's `accept*` operations.

/// A set of code points.
///
/// Implemented for string slices (every `char` of the string is a member),
/// single chars, and char slices and arrays.
///
/// ```
/// use protomap_lexer::CharSet;
///
/// assert!(" \t\n".contains_char('\t'));
/// assert!(['"', '\''].contains_char('\''));
/// assert!(!'/'.contains_char('*'));
/// ```
pub trait CharSet {
    /// Returns `true` if `c` is a member of the set.
    fn contains_char(&self, c: char) -> bool;

    /// The set as one to three ASCII bytes, if it can be written that way.
    ///
    /// Lets [`StreamDecoder::accept_run_until`](crate::StreamDecoder::accept_run_until)
    /// search buffered bytes with `memchr` instead of decoding one code
    /// point at a time. `None` always falls back to decoding.
    fn ascii_needles(&self) -> Option<&[u8]> {
        None
    }
}

impl CharSet for str {
    #[inline]
    fn contains_char(&self, c: char) -> bool {
        self.contains(c)
    }

    fn ascii_needles(&self) -> Option<&[u8]> {
        (!self.is_empty() && self.len() <= 3 && self.is_ascii()).then_some(self.as_bytes())
    }
}

impl CharSet for char {
    #[inline]
    fn contains_char(&self, c: char) -> bool {
        *self == c
    }
}

impl CharSet for [char] {
    #[inline]
    fn contains_char(&self, c: char) -> bool {
        self.contains(&c)
    }
}

impl<const N: usize> CharSet for [char; N] {
    #[inline]
    fn contains_char(&self, c: char) -> bool {
        self.contains(&c)
    }
}
