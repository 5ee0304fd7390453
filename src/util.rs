use crate::consts;
use enum_map::Enum;
use ratatui::layout::{Flex, Layout, Rect, Size};
use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Extra methods for walking through fieldless enums in declaration order
pub(crate) trait EnumExt: Enum + Sized {
    fn iter() -> impl Iterator<Item = Self> {
        (0..Self::LENGTH).map(Self::from_usize)
    }

    fn min() -> Self {
        Self::from_usize(0)
    }

    fn max() -> Self {
        Self::from_usize(Self::LENGTH - 1)
    }

    fn next(self) -> Option<Self> {
        let i = self.into_usize() + 1;
        (i < Self::LENGTH).then(|| Self::from_usize(i))
    }

    fn prev(self) -> Option<Self> {
        self.into_usize().checked_sub(1).map(Self::from_usize)
    }
}

impl<T: Enum> EnumExt for T {}

pub(crate) fn get_display_area(buffer_area: Rect) -> Rect {
    let [display] = Layout::horizontal([consts::DISPLAY_SIZE.width])
        .flex(Flex::Center)
        .areas(buffer_area);
    let [display] = Layout::vertical([consts::DISPLAY_SIZE.height])
        .flex(Flex::Center)
        .areas(display);
    display
}

/// Return a `Rect` of the given size centered within `area`
pub(crate) fn center_rect(area: Rect, size: Size) -> Rect {
    let [inner] = Layout::horizontal([size.width])
        .flex(Flex::Center)
        .areas(area);
    let [inner] = Layout::vertical([size.height])
        .flex(Flex::Center)
        .areas(inner);
    inner
}

/// Path to a file in the program's local data directory
pub(crate) fn data_file_path(name: &str) -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("neonsnake").join(name))
}

/// Displays an error followed by each of its sources, separated by colons
#[derive(Clone, Copy, Debug)]
pub(crate) struct ErrorChain<'a>(pub(crate) &'a dyn Error);

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(e) = source {
            write!(f, ": {e}")?;
            source = e.source();
        }
        Ok(())
    }
}

/// The text of each row of a buffer, for comparing rendered output in tests
#[cfg(test)]
pub(crate) fn buffer_lines(buf: &ratatui::buffer::Buffer) -> Vec<String> {
    let area = buf.area;
    (area.top()..area.bottom())
        .map(|y| {
            (area.left()..area.right())
                .map(|x| buf[(x, y)].symbol())
                .collect::<String>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use thiserror::Error;

    #[derive(Clone, Copy, Debug, Enum, Eq, PartialEq)]
    enum Pick {
        One,
        Two,
        Three,
    }

    #[test]
    fn enum_walk() {
        assert_eq!(Pick::iter().collect::<Vec<_>>(), [Pick::One, Pick::Two, Pick::Three]);
        assert_eq!(Pick::min(), Pick::One);
        assert_eq!(Pick::max(), Pick::Three);
        assert_eq!(Pick::One.next(), Some(Pick::Two));
        assert_eq!(Pick::Three.next(), None);
        assert_eq!(Pick::One.prev(), None);
        assert_eq!(Pick::Three.prev(), Some(Pick::Two));
    }

    #[rstest]
    #[case(Rect::new(0, 0, 80, 24), Size::new(20, 6), Rect::new(30, 9, 20, 6))]
    #[case(Rect::new(10, 5, 10, 4), Size::new(4, 2), Rect::new(13, 6, 4, 2))]
    fn test_center_rect(#[case] area: Rect, #[case] size: Size, #[case] expected: Rect) {
        assert_eq!(center_rect(area, size), expected);
    }

    #[derive(Debug, Error)]
    #[error("outer failure")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn error_chain() {
        let e = Outer(std::io::Error::other("disk on fire"));
        assert_eq!(ErrorChain(&e).to_string(), "outer failure: disk on fire");
    }
}
