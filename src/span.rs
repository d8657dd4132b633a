/// Byte position relative to the start of a program source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Idx(pub u32);

/// View into a program source, used to label loader diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Span {
    start: Idx,
    len: u16,
}

impl Span {
    pub fn new(start: Idx, len: u16) -> Self {
        Span { start, len }
    }

    /// Span covering `part`, which must be a subslice of `src`.
    pub fn within(src: &str, part: &str) -> Self {
        let start = part.as_ptr() as usize - src.as_ptr() as usize;
        debug_assert!(start + part.len() <= src.len(), "part is not within source");
        // Labels on oversized parts are clamped rather than wrapped
        let len = u16::try_from(part.len()).unwrap_or(u16::MAX);
        Span::new(Idx(start as u32), len)
    }

    pub fn as_range(&self) -> std::ops::Range<usize> {
        let start = self.start.0 as usize;
        let end = start + self.len as usize;
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_source() {
        let src = "0001\n  10000010 # LDI\n";
        let line = src.lines().nth(1).unwrap();
        let literal = line.split('#').next().unwrap().trim();
        assert_eq!(Span::within(src, literal).as_range(), 7..15);
        assert_eq!(&src[Span::within(src, literal).as_range()], "10000010");
    }

    #[test]
    fn long_parts_are_clamped() {
        let src = format!("01\n{}", "1".repeat(70_000));
        let literal = src.lines().nth(1).unwrap();
        assert_eq!(Span::within(&src, literal).as_range(), 3..3 + u16::MAX as usize);
    }
}
