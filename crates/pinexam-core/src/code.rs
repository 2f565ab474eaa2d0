//! Validation code generation.
//!
//! Template tokens:
//!
//! | Token     | Output                                           |
//! |-----------|--------------------------------------------------|
//! | `[0-9]`   | a random digit                                   |
//! | `A`       | a random uppercase ASCII letter                  |
//! | `a`       | a random lowercase ASCII letter                  |
//! | `[0-9]%N` | a random digit divisible by `N`                  |
//! | `%N`      | a random digit divisible by `N`                  |
//! | `{` `}`   | grouping markers, removed                        |
//!
//! Everything else, including `%0`, is copied verbatim.

use rand::Rng;

const DIGIT_CLASS: &str = "[0-9]";

/// Resolve every token of `template` using `rng`.
pub fn generate_validation_code<R: Rng + ?Sized>(template: &str, rng: &mut R) -> String {
    let chars: Vec<char> = template.chars().collect();
    let digit_class: Vec<char> = DIGIT_CLASS.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i..].starts_with(&digit_class) {
            i += digit_class.len();
            match parse_divisor(&chars, i) {
                Some((divisor, next)) => {
                    out.push(constrained_digit(divisor, rng));
                    i = next;
                }
                None => out.push(random_digit(rng)),
            }
            continue;
        }

        match chars[i] {
            '%' => match parse_divisor(&chars, i) {
                Some((divisor, next)) => {
                    out.push(constrained_digit(divisor, rng));
                    i = next;
                    continue;
                }
                None => out.push('%'),
            },
            'A' => out.push(rng.gen_range(b'A'..=b'Z') as char),
            'a' => out.push(rng.gen_range(b'a'..=b'z') as char),
            '{' | '}' => {}
            c => out.push(c),
        }
        i += 1;
    }

    out
}

/// Parse `%N` at `at` with a non-zero `N`. Returns the divisor and the index
/// after it.
fn parse_divisor(chars: &[char], at: usize) -> Option<(u32, usize)> {
    if chars.get(at) != Some(&'%') {
        return None;
    }
    let start = at + 1;
    let end = chars[start..]
        .iter()
        .position(|c| !c.is_ascii_digit())
        .map_or(chars.len(), |p| start + p);
    if end == start {
        return None;
    }
    let digits: String = chars[start..end].iter().collect();
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(divisor) => Some((divisor, end)),
    }
}

fn random_digit<R: Rng + ?Sized>(rng: &mut R) -> char {
    char::from(b'0' + rng.gen_range(0..10u8))
}

/// Draw digits until one is divisible by `divisor`. Zero always qualifies,
/// so the loop terminates.
fn constrained_digit<R: Rng + ?Sized>(divisor: u32, rng: &mut R) -> char {
    loop {
        let d = rng.gen_range(0..10u32);
        if d % divisor == 0 {
            return char::from(b'0' + d as u8);
        }
    }
}
