/// An iterator for lines similar to Lines but has an exposed `remainder` method
/// in stable Rust
///
/// Unlike [`str::lines`] this doesn't strip `\r`, the input is expected to be
/// normalised already.
pub(crate) struct Lines<'a>(&'a str);

impl Lines<'_> {
    pub(crate) fn new(s: &str) -> Lines<'_> {
        Lines(s)
    }

    pub(crate) const fn remainder(&self) -> &str {
        self.0
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_empty() {
            return None;
        }
        match self.0.split_once('\n') {
            Some((segment, remainder)) => {
                self.0 = remainder;
                Some(segment)
            }
            None => Some(std::mem::take(&mut self.0)),
        }
    }
}
