//! Card geometry and headline layout.
//!
//! All design measurements were taken against a 15001x7875 master canvas.
//! Cards are emitted at 2280x1200, the largest size the big social
//! crawlers accept, and every measurement is scaled down by the height
//! ratio so the composition stays identical.

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

pub const CARD_WIDTH: u32 = 2280;
pub const CARD_HEIGHT: u32 = 1200;

/// Height of the master canvas the design units refer to.
const MASTER_HEIGHT: u32 = 7875;

/// Fraction of the canvas height covered by the bottom fade.
pub const FADE_RATIO: f64 = 0.4;

// Design units on the master canvas.
pub const TITLE_FONT_UNITS: u32 = 580;
pub const BRAND_FONT_UNITS: u32 = 200;
pub const TEXT_MARGIN_UNITS: u32 = 400;
pub const TEXT_OFFSET_UNITS: u32 = 100;
pub const BRAND_POSITION_UNITS: u32 = 120;
pub const LINE_GAP_UNITS: u32 = 20;

/// Headlines longer than this are cut and get an ellipsis.
pub const HEADLINE_MAX_CHARS: usize = 101;

/// Master-canvas units to card pixels, truncating like the master layout did.
pub fn scale(units: u32) -> u32 {
    (units as u64 * CARD_HEIGHT as u64 / MASTER_HEIGHT as u64) as u32
}

pub fn fade_height() -> u32 {
    (CARD_HEIGHT as f64 * FADE_RATIO) as u32
}

pub fn fade_top() -> u32 {
    CARD_HEIGHT - fade_height()
}

/// Vertical distance between the tops of consecutive headline lines.
pub fn line_advance(font_px: u32) -> u32 {
    font_px + font_px / 5 + scale(LINE_GAP_UNITS)
}

// ---------------------------------------------------------------------------
// Headline shaping
// ---------------------------------------------------------------------------

pub fn truncate_headline(title: &str) -> String {
    if title.chars().count() <= HEADLINE_MAX_CHARS {
        return title.to_string();
    }
    let cut: String = title.chars().take(HEADLINE_MAX_CHARS).collect();
    format!("{cut}...")
}

/// Advance width of one glyph as a fraction of the font size. Tuned for a
/// bold grotesque; close enough for line breaking, which only needs to know
/// roughly where a line stops fitting.
fn glyph_factor(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '!' | '.' | ',' | '\'' | '|' | ':' | ';' => 0.30,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.40,
        'm' | 'w' => 0.85,
        'M' | 'W' | '@' => 0.95,
        ' ' => 0.28,
        c if c.is_ascii_digit() => 0.55,
        c if c.is_ascii_uppercase() => 0.70,
        c if c.is_ascii_lowercase() => 0.54,
        _ => 0.60,
    }
}

/// Estimated pixel width of `text` at `font_px`.
pub fn text_width(text: &str, font_px: u32) -> u32 {
    let units: f64 = text.chars().map(glyph_factor).sum();
    (units * font_px as f64).round() as u32
}

/// Greedy word wrap against the estimated width. A single word wider than
/// `max_width` becomes its own line rather than being split.
pub fn wrap_text(text: &str, font_px: u32, max_width: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font_px) <= max_width {
            current = candidate;
        } else if current.is_empty() {
            lines.push(word.to_string());
        } else {
            lines.push(std::mem::take(&mut current));
            if text_width(word, font_px) <= max_width {
                current = word.to_string();
            } else {
                lines.push(word.to_string());
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ---------------------------------------------------------------------------
// Markup escaping
// ---------------------------------------------------------------------------

/// Escape text for embedding in SVG markup.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_matches_master_layout() {
        assert_eq!(scale(TITLE_FONT_UNITS), 88);
        assert_eq!(scale(BRAND_FONT_UNITS), 30);
        assert_eq!(scale(TEXT_MARGIN_UNITS), 60);
        assert_eq!(scale(TEXT_OFFSET_UNITS), 15);
        assert_eq!(scale(BRAND_POSITION_UNITS), 18);
    }

    #[test]
    fn fade_covers_bottom_two_fifths() {
        assert_eq!(fade_height(), 480);
        assert_eq!(fade_top(), 720);
    }

    #[test]
    fn short_headline_is_untouched() {
        assert_eq!(truncate_headline("Short title"), "Short title");
    }

    #[test]
    fn headline_at_limit_is_untouched() {
        let title = "a".repeat(HEADLINE_MAX_CHARS);
        assert_eq!(truncate_headline(&title), title);
    }

    #[test]
    fn long_headline_is_cut_with_ellipsis() {
        let title = "a".repeat(150);
        let cut = truncate_headline(&title);
        assert_eq!(cut.chars().count(), HEADLINE_MAX_CHARS + 3);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let title = "å".repeat(150);
        let cut = truncate_headline(&title);
        assert_eq!(cut.chars().count(), HEADLINE_MAX_CHARS + 3);
    }

    #[test]
    fn narrow_glyphs_measure_narrower() {
        assert!(text_width("iiii", 88) < text_width("MMMM", 88));
    }

    #[test]
    fn wrapped_lines_fit_the_width() {
        let text = "The quick brown fox jumps over the lazy dog while the crowd watches in silence";
        let lines = wrap_text(text, 88, 2220);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 88) <= 2220, "too wide: {line}");
        }
    }

    #[test]
    fn wrap_preserves_every_word() {
        let text = "one two three four five six seven eight nine ten";
        let lines = wrap_text(text, 88, 600);
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn oversized_word_gets_its_own_line() {
        let lines = wrap_text("tiny Pneumonoultramicroscopicsilicovolcanoconiosis end", 88, 400);
        assert!(lines.contains(&"Pneumonoultramicroscopicsilicovolcanoconiosis".to_string()));
    }

    #[test]
    fn empty_text_wraps_to_nothing() {
        assert!(wrap_text("", 88, 2220).is_empty());
        assert!(wrap_text("   ", 88, 2220).is_empty());
    }

    #[test]
    fn escape_handles_markup_chars() {
        assert_eq!(
            escape_xml(r#"Fish & "Chips" <now>"#),
            "Fish &amp; &quot;Chips&quot; &lt;now&gt;"
        );
        assert_eq!(escape_xml("it's"), "it&apos;s");
    }
}
