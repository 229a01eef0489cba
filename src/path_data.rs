//! SVG path data: parsing, compact writing and conservative bounds.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PathDataError {
    #[error("path data must start with a moveto command")]
    MissingMoveTo,

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("command '{command}' is missing arguments at offset {offset}")]
    MissingArguments { command: char, offset: usize },

    #[error("invalid arc flag at offset {offset}")]
    InvalidFlag { offset: usize },
}

/// One command with a single argument group. Implicit repetitions are split
/// into separate segments during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub command: char,
    pub args: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    fn point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn expand(&self, by: f64) -> Bounds {
        Bounds {
            min_x: self.min_x - by,
            min_y: self.min_y - by,
            max_x: self.max_x + by,
            max_y: self.max_y + by,
        }
    }

    /// Touching edges count as overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

fn arg_count(command: char) -> Option<usize> {
    match command.to_ascii_uppercase() {
        'M' | 'L' | 'T' => Some(2),
        'H' | 'V' => Some(1),
        'C' => Some(6),
        'S' | 'Q' => Some(4),
        'A' => Some(7),
        'Z' => Some(0),
        _ => None,
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn skip_separators(&mut self) {
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_whitespace() || self.bytes[self.pos] == b',')
        {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_number(&self) -> bool {
        matches!(self.peek(), Some(b'0'..=b'9' | b'-' | b'+' | b'.'))
    }

    fn number(&mut self) -> Option<f64> {
        let start = self.pos;
        let mut end = self.pos;
        if matches!(self.bytes.get(end), Some(b'-' | b'+')) {
            end += 1;
        }
        let mut digits = 0;
        while matches!(self.bytes.get(end), Some(b'0'..=b'9')) {
            end += 1;
            digits += 1;
        }
        if self.bytes.get(end) == Some(&b'.') {
            end += 1;
            while matches!(self.bytes.get(end), Some(b'0'..=b'9')) {
                end += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return None;
        }
        if matches!(self.bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(self.bytes.get(exp), Some(b'-' | b'+')) {
                exp += 1;
            }
            if matches!(self.bytes.get(exp), Some(b'0'..=b'9')) {
                while matches!(self.bytes.get(exp), Some(b'0'..=b'9')) {
                    exp += 1;
                }
                end = exp;
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..end]).ok()?;
        let value = text.parse::<f64>().ok().filter(|v| v.is_finite())?;
        self.pos = end;
        Some(value)
    }

    fn flag(&mut self) -> Option<f64> {
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                Some(0.0)
            }
            Some(b'1') => {
                self.pos += 1;
                Some(1.0)
            }
            _ => None,
        }
    }
}

impl PathData {
    pub fn parse(d: &str) -> Result<Self, PathDataError> {
        let mut cursor = Cursor {
            bytes: d.as_bytes(),
            pos: 0,
        };
        let mut segments: Vec<Segment> = Vec::new();

        cursor.skip_separators();
        while let Some(byte) = cursor.peek() {
            let command = byte as char;
            let Some(count) = arg_count(command) else {
                return Err(PathDataError::UnexpectedChar {
                    ch: d[cursor.pos..].chars().next().unwrap_or(command),
                    offset: cursor.pos,
                });
            };
            if segments.is_empty() && !matches!(command, 'M' | 'm') {
                return Err(PathDataError::MissingMoveTo);
            }
            cursor.pos += 1;

            if count == 0 {
                segments.push(Segment {
                    command,
                    args: Vec::new(),
                });
                cursor.skip_separators();
                continue;
            }

            let mut current = command;
            let mut first = true;
            loop {
                cursor.skip_separators();
                if !first && !cursor.at_number() {
                    break;
                }
                let mut args = Vec::with_capacity(count);
                for i in 0..count {
                    cursor.skip_separators();
                    let offset = cursor.pos;
                    let value = if current.eq_ignore_ascii_case(&'a') && (i == 3 || i == 4) {
                        cursor.flag().ok_or(PathDataError::InvalidFlag { offset })?
                    } else {
                        cursor.number().ok_or(PathDataError::MissingArguments {
                            command: current,
                            offset,
                        })?
                    };
                    args.push(value);
                }
                segments.push(Segment {
                    command: current,
                    args,
                });
                // extra pairs after a moveto are implicit linetos
                current = match current {
                    'M' => 'L',
                    'm' => 'l',
                    other => other,
                };
                first = false;
            }
        }

        // a leading relative moveto is absolute
        if let Some(first) = segments.first_mut() {
            first.command = 'M';
        }
        Ok(Self { segments })
    }

    /// Compact serialization with numbers rounded to `precision` decimals.
    pub fn write(&self, precision: u8) -> String {
        let mut out = String::new();
        let mut previous: Option<char> = None;
        for segment in &self.segments {
            let repeat = previous == Some(segment.command)
                && !matches!(segment.command, 'M' | 'm' | 'Z' | 'z');
            if !repeat {
                out.push(segment.command);
            }
            for (i, value) in segment.args.iter().enumerate() {
                let text = format_number(*value, precision);
                let needs_space = (i > 0 || repeat) && !text.starts_with('-');
                if needs_space {
                    out.push(' ');
                }
                out.push_str(&text);
            }
            previous = Some(segment.command);
        }
        out
    }

    /// Bounding box of all end and control points. Curves stay inside the
    /// hull of their control points; arcs are padded by their radius.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds: Option<Bounds> = None;
        let (mut x, mut y) = (0.0_f64, 0.0_f64);
        let (mut start_x, mut start_y) = (0.0_f64, 0.0_f64);
        let mut last_control: Option<(f64, f64)> = None;

        let include = |bounds: &mut Option<Bounds>, px: f64, py: f64| match bounds {
            Some(b) => b.include(px, py),
            None => *bounds = Some(Bounds::point(px, py)),
        };

        for segment in &self.segments {
            let relative = segment.command.is_ascii_lowercase();
            let (ox, oy) = if relative { (x, y) } else { (0.0, 0.0) };
            let a = &segment.args;
            let mut control = None;
            match segment.command.to_ascii_uppercase() {
                'M' => {
                    x = ox + a[0];
                    y = oy + a[1];
                    start_x = x;
                    start_y = y;
                    include(&mut bounds, x, y);
                }
                'L' | 'T' => {
                    if segment.command.eq_ignore_ascii_case(&'t') {
                        let (cx, cy) = reflect(last_control, x, y);
                        include(&mut bounds, cx, cy);
                        control = Some((cx, cy));
                    }
                    x = ox + a[0];
                    y = oy + a[1];
                    include(&mut bounds, x, y);
                }
                'H' => {
                    x = ox + a[0];
                    include(&mut bounds, x, y);
                }
                'V' => {
                    y = oy + a[0];
                    include(&mut bounds, x, y);
                }
                'C' => {
                    include(&mut bounds, ox + a[0], oy + a[1]);
                    include(&mut bounds, ox + a[2], oy + a[3]);
                    control = Some((ox + a[2], oy + a[3]));
                    x = ox + a[4];
                    y = oy + a[5];
                    include(&mut bounds, x, y);
                }
                'S' => {
                    let (cx, cy) = reflect(last_control, x, y);
                    include(&mut bounds, cx, cy);
                    include(&mut bounds, ox + a[0], oy + a[1]);
                    control = Some((ox + a[0], oy + a[1]));
                    x = ox + a[2];
                    y = oy + a[3];
                    include(&mut bounds, x, y);
                }
                'Q' => {
                    include(&mut bounds, ox + a[0], oy + a[1]);
                    control = Some((ox + a[0], oy + a[1]));
                    x = ox + a[2];
                    y = oy + a[3];
                    include(&mut bounds, x, y);
                }
                'A' => {
                    let (end_x, end_y) = (ox + a[5], oy + a[6]);
                    let chord = ((end_x - x).powi(2) + (end_y - y).powi(2)).sqrt();
                    let reach = a[0].abs().max(a[1].abs()).max(chord / 2.0) * 2.0;
                    include(&mut bounds, x - reach, y - reach);
                    include(&mut bounds, x + reach, y + reach);
                    x = end_x;
                    y = end_y;
                    include(&mut bounds, x, y);
                }
                _ => {
                    x = start_x;
                    y = start_y;
                }
            }
            last_control = control;
        }
        bounds
    }
}

fn reflect(control: Option<(f64, f64)>, x: f64, y: f64) -> (f64, f64) {
    match control {
        Some((cx, cy)) => (2.0 * x - cx, 2.0 * y - cy),
        None => (x, y),
    }
}

/// Round to `precision` decimals and drop redundant zeros: `0.500` -> `.5`.
pub fn format_number(value: f64, precision: u8) -> String {
    let mut text = format!("{:.*}", precision as usize, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        return "0".to_string();
    }
    if let Some(rest) = text.strip_prefix("0.") {
        return format!(".{}", rest);
    }
    if let Some(rest) = text.strip_prefix("-0.") {
        return format!("-.{}", rest);
    }
    text
}
