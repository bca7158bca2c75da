//! Enum constant values and name prefixes.

use crate::meta::IntegerValue;
use crate::source::RawInteger;

/// Convert a front-end integer to its serialized form.
///
/// Signed constants with the sign bit of their width set are sign extended.
/// Anything needing all 64 bits is signed as well, reinterpreting the bits.
pub fn integer_value(raw: RawInteger) -> IntegerValue {
    let width = raw.width.clamp(1, 64);
    let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
    let bits = raw.bits & mask;
    let sign_bit = 1u64 << (width - 1);

    if !raw.unsigned && bits & sign_bit != 0 {
        return IntegerValue::Signed((bits | !mask) as i64);
    }
    if bits >> 63 != 0 {
        return IntegerValue::Signed(bits as i64);
    }
    IntegerValue::Unsigned(bits)
}

/// Longest prefix shared by every name that ends at a word boundary.
///
/// A boundary is an uppercase letter or the character after an `_`, and the
/// remainder of each name must not start with a digit. Fewer than two names
/// never have a prefix.
pub fn common_prefix<'n>(names: &[&'n str]) -> &'n str {
    let Some((first, rest)) = names.split_first() else {
        return "";
    };
    if rest.is_empty() {
        return "";
    }

    let mut len = first.len();
    for name in rest {
        len = first
            .bytes()
            .zip(name.bytes())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count();
    }

    while len > 0 && !names.iter().all(|name| is_boundary(name, len)) {
        len -= 1;
    }
    &first[..len]
}

fn is_boundary(name: &str, at: usize) -> bool {
    if !name.is_char_boundary(at) {
        return false;
    }
    let bytes = name.as_bytes();
    let Some(&next) = bytes.get(at) else {
        return false;
    };
    if next.is_ascii_digit() {
        return false;
    }
    next.is_ascii_uppercase() || bytes[at - 1] == b'_'
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_common_prefix() {
        assert_eq!(
            common_prefix(&[
                "UIViewAnimationCurveEaseIn",
                "UIViewAnimationCurveEaseOut",
                "UIViewAnimationCurveLinear",
            ]),
            "UIViewAnimationCurve"
        );
        assert_eq!(common_prefix(&["NSOrderedAscending", "NSOrderedSame"]), "NSOrdered");
        assert_eq!(common_prefix(&["kCFNumber_A", "kCFNumber_B"]), "kCFNumber_");
    }

    #[test]
    fn test_common_prefix_backs_off_to_word_boundary() {
        // shared "Sta" must not split "Start"/"Stop"
        assert_eq!(common_prefix(&["MyStateStart", "MyStateStop"]), "MyState");
        assert_eq!(common_prefix(&["Level1", "Level2"]), "");
        assert_eq!(common_prefix(&["Red", "Green"]), "");
    }

    #[test]
    fn test_common_prefix_needs_two_names() {
        assert_eq!(common_prefix(&[]), "");
        assert_eq!(common_prefix(&["NSOnlyCase"]), "");
    }

    #[test]
    fn test_integer_values() {
        assert_eq!(integer_value(RawInteger::signed(5, 32)), IntegerValue::Unsigned(5));
        assert_eq!(
            integer_value(RawInteger::signed(0xFFFF_FFFF, 32)),
            IntegerValue::Signed(-1)
        );
        assert_eq!(
            integer_value(RawInteger::unsigned(0x8000_0000, 32)),
            IntegerValue::Unsigned(0x8000_0000)
        );
        assert_eq!(
            integer_value(RawInteger::unsigned(u64::MAX, 64)),
            IntegerValue::Signed(-1)
        );
        assert_eq!(
            integer_value(RawInteger::signed(u64::MAX, 64)),
            IntegerValue::Signed(-1)
        );
    }
}
