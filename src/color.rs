//! Paint classification for color attributes. Parsing is done by `svgtypes`.

/// Fill of shapes that set no `fill` anywhere up their ancestry.
pub const IMPLICIT_BLACK: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    None,
    Current,
    Inherit,
    /// `url(#...)` paint servers and context paints.
    Reference,
    Color(svgtypes::Color),
}

impl Paint {
    /// `none` and fully transparent colors paint nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Paint::None => true,
            Paint::Color(c) => c.alpha == 0,
            _ => false,
        }
    }

    /// Key used to count distinct concrete colors in an icon.
    pub fn key(&self) -> Option<[u8; 4]> {
        match self {
            Paint::Color(c) if c.alpha > 0 => Some([c.red, c.green, c.blue, c.alpha]),
            _ => None,
        }
    }
}

/// `None` for anything that is not valid paint.
pub fn parse_paint(value: &str) -> Option<Paint> {
    let paint = match svgtypes::Paint::from_str(value.trim()).ok()? {
        svgtypes::Paint::None => Paint::None,
        svgtypes::Paint::Inherit => Paint::Inherit,
        svgtypes::Paint::CurrentColor => Paint::Current,
        svgtypes::Paint::Color(color) => Paint::Color(color),
        _ => Paint::Reference,
    };
    Some(paint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(parse_paint("none"), Some(Paint::None));
        assert_eq!(parse_paint(" currentColor "), Some(Paint::Current));
        assert_eq!(parse_paint("inherit"), Some(Paint::Inherit));
        assert_eq!(parse_paint("url(#grad)"), Some(Paint::Reference));
        assert_eq!(parse_paint("bogus"), None);
    }

    #[test]
    fn test_same_color_same_key() {
        let keys: Vec<_> = ["#000", "#000000", "black", "rgb(0, 0, 0)"]
            .iter()
            .map(|v| parse_paint(v).and_then(|p| p.key()))
            .collect();
        assert!(keys.iter().all(|k| *k == Some(IMPLICIT_BLACK)));
        assert_ne!(
            parse_paint("#f00").and_then(|p| p.key()),
            parse_paint("hsl(120, 100%, 50%)").and_then(|p| p.key())
        );
    }

    #[test]
    fn test_empty_paints() {
        assert!(parse_paint("none").unwrap().is_empty());
        assert!(parse_paint("transparent").unwrap().is_empty());
        assert!(parse_paint("rgba(10, 20, 30, 0)").unwrap().is_empty());
        assert!(!parse_paint("#123").unwrap().is_empty());
        assert_eq!(parse_paint("transparent").unwrap().key(), None);
    }
}
