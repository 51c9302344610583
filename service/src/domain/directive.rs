use url::form_urlencoded;

/// Normalized resize parameters taken from the viewer's query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeDirective {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub webp: bool,
}

impl ResizeDirective {
    pub fn is_unconstrained(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

/// Best-effort parse of `w`, `h` and `webp`. Never fails: anything that is
/// not a positive integer is treated as absent.
pub fn decode(query: &str) -> ResizeDirective {
    let mut width: Option<Option<u32>> = None;
    let mut height: Option<Option<u32>> = None;
    let mut webp = false;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "w" if width.is_none() => width = Some(parse_dimension(&value)),
            "h" if height.is_none() => height = Some(parse_dimension(&value)),
            "webp" => webp = true,
            _ => {}
        }
    }

    ResizeDirective {
        width: width.flatten(),
        height: height.flatten(),
        webp,
    }
}

/// Leading-digit integer parse: `" 200px"` is 200, `"abc"`, `"0"` and
/// `"-3"` are absent.
fn parse_dimension(value: &str) -> Option<u32> {
    let trimmed = value.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..digits_end]
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_and_height() {
        assert_eq!(
            decode("w=200&h=100"),
            ResizeDirective {
                width: Some(200),
                height: Some(100),
                webp: false
            }
        );
    }

    #[test]
    fn non_numeric_width_is_absent() {
        let directive = decode("w=abc");
        assert_eq!(directive.width, None);
        assert!(directive.is_unconstrained());
    }

    #[test]
    fn non_positive_values_are_absent() {
        assert_eq!(decode("w=0&h=-20"), ResizeDirective::default());
    }

    #[test]
    fn empty_webp_value_still_transcodes() {
        assert!(decode("webp=").webp);
        assert!(decode("webp").webp);
        assert!(decode("w=10&webp=0").webp);
    }

    #[test]
    fn first_occurrence_wins() {
        let directive = decode("w=300&w=100&h=abc&h=50");
        assert_eq!(directive.width, Some(300));
        assert_eq!(directive.height, None);
    }

    #[test]
    fn leading_digits_are_used() {
        assert_eq!(decode("w=%20120px").width, Some(120));
        assert_eq!(decode("h=+64").height, Some(64));
    }

    #[test]
    fn form_encoding_is_decoded() {
        assert_eq!(decode("%77=40&h=%3530").width, Some(40));
        assert_eq!(decode("%77=40&h=%3530").height, Some(50));
        assert!(decode("web%70").webp);
        // malformed escapes are kept as written and then fail the digit parse
        assert_eq!(decode("w=%zz10&h=12%").height, Some(12));
    }

    #[test]
    fn overflowing_values_are_absent() {
        assert_eq!(decode("w=99999999999").width, None);
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        assert_eq!(decode("width=200&foo&&"), ResizeDirective::default());
    }
}
