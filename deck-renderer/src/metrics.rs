//! Text measurement and line wrapping.
//!
//! Advance widths are the Helvetica AFM metrics, which Arial shares. They
//! drive wrapping on the live surface and in the fixed-page document, so both
//! break lines at the same words.

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Width used for characters outside the table.
const FALLBACK_WIDTH: u16 = 556;

/// Default line height as a multiple of the font size.
pub const DEFAULT_LINE_HEIGHT: f32 = 1.15;

fn char_width(c: char) -> u16 {
    usize::try_from(u32::from(c))
        .ok()
        .and_then(|code| code.checked_sub(32))
        .and_then(|index| HELVETICA_WIDTHS.get(index))
        .copied()
        .unwrap_or(FALLBACK_WIDTH)
}

/// Width of `text` at `font_size`, in the font size's unit.
#[must_use]
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    #[allow(clippy::cast_precision_loss)]
    let units = units as f32;
    units * font_size / 1000.0
}

/// Greedy word wrap of `text` to `max_width`.
///
/// Explicit newlines always break. A word wider than the line is split
/// between characters. A non-positive width disables wrapping.
#[must_use]
pub fn wrap_lines(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        if max_width <= 0.0 {
            lines.push(paragraph.to_string());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, font_size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width(word, font_size) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if text_width(&current, font_size) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width_uses_afm_widths() {
        // H = 722, i = 222
        assert!((text_width("Hi", 10.0) - 9.44).abs() < 1e-4);
        assert!((text_width("", 10.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        let lines = wrap_lines("Hello brave new world", 10.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 10.0) <= 60.0);
        }
        assert_eq!(lines.join(" "), "Hello brave new world");
    }

    #[test]
    fn test_wrap_keeps_explicit_newlines() {
        let lines = wrap_lines("a\nb", 12.0, 1000.0);
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_lines("WWWWWWWWWW", 10.0, 30.0);
        assert!(lines.len() >= 3);
        assert_eq!(lines.concat(), "WWWWWWWWWW");
    }
}
