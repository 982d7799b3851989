//! Exact decimal text handling.
//!
//! Decimal values are kept as canonical strings: optional `-`, integer digits
//! without leading zeros, and an optional fraction. Quantizing to a number of
//! places rounds half to even.

/// Parse and canonicalize decimal text, quantizing to `places` if given.
///
/// Accepts an optional sign, digits with an optional fraction, and exponent
/// notation. Returns `None` for anything else.
pub fn normalize(text: &str, places: Option<u32>) -> Option<String> {
    let text = text.trim();
    if text.contains(['e', 'E']) {
        let number: f64 = text.parse().ok()?;
        if !number.is_finite() {
            return None;
        }
        return normalize(&format!("{}", number), places);
    }

    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }
    let int_part = if int_part.is_empty() { "0" } else { int_part };

    let (int_digits, frac_digits) = match places {
        Some(places) => round_half_even(int_part, frac_part, places as usize),
        None => (int_part.to_string(), frac_part.to_string()),
    };

    let int_digits = int_digits.trim_start_matches('0');
    let int_digits = if int_digits.is_empty() { "0" } else { int_digits };
    let is_zero = int_digits == "0" && frac_digits.bytes().all(|b| b == b'0');

    let mut out = String::with_capacity(int_digits.len() + frac_digits.len() + 2);
    if negative && !is_zero {
        out.push('-');
    }
    out.push_str(int_digits);
    if !frac_digits.is_empty() {
        out.push('.');
        out.push_str(&frac_digits);
    }
    Some(out)
}

fn round_half_even(int_part: &str, frac_part: &str, places: usize) -> (String, String) {
    if frac_part.len() <= places {
        return (
            int_part.to_string(),
            format!("{:0<width$}", frac_part, width = places),
        );
    }

    let next = frac_part.as_bytes()[places] - b'0';
    let rest_nonzero = frac_part.as_bytes()[places + 1..].iter().any(|&b| b != b'0');
    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part[..places].bytes())
        .map(|b| b - b'0')
        .collect();
    let last_odd = digits.last().is_some_and(|d| d % 2 == 1);

    if next > 5 || (next == 5 && (rest_nonzero || last_odd)) {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let split = digits.len() - places;
    let render = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    (render(&digits[..split]), render(&digits[split..]))
}
