//! Translation of LDML date/time patterns (`yyyy-MM-dd'T'HH:mm:ss`) into
//! chrono strftime strings.

/// How `X`/`x` offset markers are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OffsetMarker {
    /// `±hh:mm` only.
    Strict,
    /// Also `Z`, `±hh` and `±hhmm`.
    Permissive,
}

impl OffsetMarker {
    fn strftime(self) -> &'static str {
        match self {
            Self::Strict => "%:z",
            Self::Permissive => "%#z",
        }
    }
}

pub(crate) fn to_strftime(pattern: &str, marker: OffsetMarker) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\'' {
            // '' is a literal quote, 'text' a quoted literal.
            if chars.next_if_eq(&'\'').is_some() {
                out.push('\'');
                continue;
            }
            while let Some(quoted) = chars.next() {
                if quoted == '\'' {
                    if chars.next_if_eq(&'\'').is_some() {
                        out.push('\'');
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, quoted);
            }
        } else if ch.is_ascii_alphabetic() {
            let mut width = 1;
            while chars.next_if_eq(&ch).is_some() {
                width += 1;
            }
            match field(ch, width, marker) {
                Some(spec) => out.push_str(spec),
                None => (0..width).for_each(|_| push_literal(&mut out, ch)),
            }
        } else {
            push_literal(&mut out, ch);
        }
    }
    out
}

/// Whether the pattern ends with a run of one to three `X` or `x`
/// markers that follows at least one other character.
pub(crate) fn ends_with_offset_marker(pattern: &str) -> bool {
    let Some(last) = pattern.chars().last().filter(|ch| matches!(ch, 'X' | 'x')) else {
        return false;
    };
    let head = pattern.trim_end_matches(last);
    let run = pattern.len() - head.len();
    (1..=3).contains(&run) && !head.is_empty() && !head.ends_with(['X', 'x'])
}

fn field(ch: char, width: usize, marker: OffsetMarker) -> Option<&'static str> {
    let spec = match (ch, width) {
        ('y' | 'u', 2) => "%y",
        ('y' | 'u', _) => "%Y",
        ('M' | 'L', 1 | 2) => "%m",
        ('M' | 'L', 3) => "%b",
        ('M' | 'L', _) => "%B",
        ('d', _) => "%d",
        ('D', _) => "%j",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('a', _) => "%p",
        ('H', _) => "%H",
        ('h', _) => "%I",
        ('m', _) => "%M",
        ('s', _) => "%S",
        ('S', 1..=3) => "%3f",
        ('S', 4..=6) => "%6f",
        ('S', _) => "%9f",
        ('X' | 'x', _) => marker.strftime(),
        ('Z', _) => "%#z",
        ('z', _) => "%Z",
        _ => return None,
    };
    Some(spec)
}

fn push_literal(out: &mut String, ch: char) {
    if ch == '%' {
        out.push_str("%%");
    } else {
        out.push(ch);
    }
}
