//! Lua-native scalar coercions
//!
//! String <-> number conversions following Lua 5.4 rules, so that `Value`
//! accessors can coerce without a round trip into the interpreter.

/// Format a float the way Lua 5.4 `tostring` does
///
/// `%.14g`, then `.0` is appended when the result would read back as an
/// integer.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return if n.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let mut s = format_general(n);
    if looks_like_int(&s) {
        s.push_str(".0");
    }
    s
}

/// Convert a string to a number (integer or float), Lua style
///
/// Leading and trailing whitespace is allowed. Hexadecimal numerals are
/// accepted, including fractions and binary `p` exponents; `inf`/`nan`
/// spellings are not.
pub fn str_to_number(s: &str) -> Option<f64> {
    let t = s.trim_matches(|c: char| c.is_ascii_whitespace());
    if let Some(i) = str_to_integer(t) {
        return Some(i as f64);
    }
    let (negative, body) = split_sign(t);
    if let Some(hex) = strip_hex_prefix(body) {
        return hex_to_float(hex).map(|f| if negative { -f } else { f });
    }

    let is_decimal = !t.is_empty()
        && t.bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !is_decimal {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Convert a string to an integer without going through floats
///
/// Decimal literals that overflow `i64` return `None` (Lua would then read
/// them as floats). Hexadecimal literals wrap around like Lua's.
pub fn str_to_integer(s: &str) -> Option<i64> {
    let t = s.trim_matches(|c: char| c.is_ascii_whitespace());
    let (negative, body) = split_sign(t);

    if let Some(hex) = strip_hex_prefix(body) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let magnitude = hex.bytes().fold(0i64, |acc, b| {
            let digit = (b as char).to_digit(16).unwrap_or(0) as i64;
            acc.wrapping_mul(16).wrapping_add(digit)
        });
        return Some(if negative { magnitude.wrapping_neg() } else { magnitude });
    }

    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let signed = if negative { format!("-{body}") } else { body.to_string() };
    signed.parse::<i64>().ok()
}

/// Truncate a float toward zero, saturating at the `i64` bounds (NaN -> 0)
pub fn float_to_integer(n: f64) -> i64 {
    n as i64
}

fn split_sign(t: &str) -> (bool, &str) {
    match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    }
}

fn strip_hex_prefix(body: &str) -> Option<&str> {
    body.strip_prefix("0x").or_else(|| body.strip_prefix("0X"))
}

/// Hex mantissa with optional fraction and `p` exponent (`A.8`, `1p4`)
fn hex_to_float(hex: &str) -> Option<f64> {
    let (mantissa, exponent) = match hex.find(|c: char| c == 'p' || c == 'P') {
        Some(i) => (&hex[..i], Some(&hex[i + 1..])),
        None => (hex, None),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut value = 0.0f64;
    for c in int_part.chars() {
        value = value * 16.0 + c.to_digit(16)? as f64;
    }
    let mut scale = 1.0 / 16.0;
    for c in frac_part.chars() {
        value += c.to_digit(16)? as f64 * scale;
        scale /= 16.0;
    }

    if let Some(exp) = exponent {
        let digits = exp.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(exp);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // 超出范围的指数直接饱和为 0 或 inf
        let e = exp.parse::<i32>().unwrap_or(if exp.starts_with('-') { i32::MIN } else { i32::MAX });
        value *= 2f64.powi(e.clamp(-2200, 2200));
    }
    Some(value)
}

/// C `%.14g`
fn format_general(n: f64) -> String {
    const PRECISION: i32 = 14;

    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // 科学计数法先确定舍入后的指数
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, n);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, n))
    }
}

fn trim_fraction(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

fn looks_like_int(s: &str) -> bool {
    s.bytes().all(|b| b == b'-' || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_string_matches_lua() {
        assert_eq!(number_to_string(1.5), "1.5");
        assert_eq!(number_to_string(3.0), "3.0");
        assert_eq!(number_to_string(-0.0), "-0.0");
        assert_eq!(number_to_string(0.1), "0.1");
        assert_eq!(number_to_string(1.0 / 3.0), "0.33333333333333");
        assert_eq!(number_to_string(1e15), "1e+15");
        assert_eq!(number_to_string(1e100), "1e+100");
        assert_eq!(number_to_string(2.5e-7), "2.5e-07");
        assert_eq!(number_to_string(123456.789), "123456.789");
        assert_eq!(number_to_string(f64::INFINITY), "inf");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_str_to_number() {
        assert_eq!(str_to_number("42"), Some(42.0));
        assert_eq!(str_to_number("  -3.25  "), Some(-3.25));
        assert_eq!(str_to_number("1e3"), Some(1000.0));
        assert_eq!(str_to_number(".5"), Some(0.5));
        assert_eq!(str_to_number("0x10"), Some(16.0));
        assert_eq!(str_to_number("0x1p4"), Some(16.0));
        assert_eq!(str_to_number("0xA.8"), Some(10.5));
        assert_eq!(str_to_number(" -0x.8P1 "), Some(-1.0));
        assert_eq!(str_to_number("0x1p-2"), Some(0.25));
        assert_eq!(str_to_number("0x.p1"), None);
        assert_eq!(str_to_number("0x1p"), None);
        assert_eq!(str_to_number("0x1g"), None);
        assert_eq!(str_to_number("inf"), None);
        assert_eq!(str_to_number("nan"), None);
        assert_eq!(str_to_number("12abc"), None);
        assert_eq!(str_to_number(""), None);
    }

    #[test]
    fn test_str_to_integer() {
        assert_eq!(str_to_integer("17"), Some(17));
        assert_eq!(str_to_integer("-17"), Some(-17));
        assert_eq!(str_to_integer("0xff"), Some(255));
        assert_eq!(str_to_integer("-0x1"), Some(-1));
        assert_eq!(str_to_integer("1.5"), None);
        assert_eq!(str_to_integer("9223372036854775808"), None);
        assert_eq!(str_to_integer("0x"), None);
    }

    #[test]
    fn test_float_to_integer_truncates() {
        assert_eq!(float_to_integer(2.9), 2);
        assert_eq!(float_to_integer(-2.9), -2);
        assert_eq!(float_to_integer(f64::NAN), 0);
        assert_eq!(float_to_integer(1e300), i64::MAX);
    }
}
