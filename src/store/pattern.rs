//! Glob patterns for key listing
//!
//! Supported syntax (same as Redis `KEYS`):
//! - `*` any run of characters, `?` exactly one character
//! - `[abc]`, `[^abc]`, `[a-z]` character classes
//! - `\x` matches `x` literally

/// Whether `text` matches the glob `pattern`
///
/// Runs in O(pattern × text): on a mismatch only the most recent `*` is
/// retried, one text character further along.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    // Pattern index just past the last `*`, and the text index it resumes at
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if p.get(pi) == Some(&'*') {
            while p.get(pi) == Some(&'*') {
                pi += 1;
            }
            backtrack = Some((pi, ti));
            continue;
        }

        if let Some(consumed) = match_one(&p[pi..], t[ti]) {
            pi += consumed;
            ti += 1;
            continue;
        }

        match backtrack {
            Some((star_pi, star_ti)) => {
                pi = star_pi;
                ti = star_ti + 1;
                backtrack = Some((star_pi, ti));
            }
            None => return false,
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

/// Match one text character against the token at the head of `p`
///
/// Returns how many pattern chars the token spans, or `None` on a mismatch
/// (including an exhausted pattern).
fn match_one(p: &[char], c: char) -> Option<usize> {
    match *p.first()? {
        '?' => Some(1),
        '[' => {
            let (hit, consumed) = match_class(&p[1..], c);
            hit.then_some(1 + consumed)
        }
        '\\' if p.len() > 1 => (p[1] == c).then_some(2),
        other => (other == c).then_some(1),
    }
}

/// Match `c` against the class body following `[`
///
/// Returns the result and how many pattern chars were consumed, including
/// the closing `]`. An unterminated class ends at the end of the pattern.
fn match_class(p: &[char], c: char) -> (bool, usize) {
    let negate = p.first() == Some(&'^');
    let mut i = usize::from(negate);
    let mut hit = false;

    while i < p.len() {
        match p[i] {
            ']' => {
                i += 1;
                return (hit != negate, i);
            }
            '\\' if i + 1 < p.len() => {
                hit |= p[i + 1] == c;
                i += 2;
            }
            lo if i + 2 < p.len() && p[i + 1] == '-' && p[i + 2] != ']' => {
                let hi = p[i + 2];
                let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                hit |= (lo..=hi).contains(&c);
                i += 3;
            }
            other => {
                hit |= other == c;
                i += 1;
            }
        }
    }

    (hit != negate, i)
}
