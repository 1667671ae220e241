//! SignalK path naming.
//!
//! SignalK paths are dot-separated strings like "navigation.speedOverGround".
//! Time-series stores want flat field names, so paths are folded into a
//! single camelCase identifier: "navigationSpeedOverGround".
//!
//! Word boundaries are the separators `.`, `_`, `-` and space, plus the
//! humps already present in the path ("speedOverGround" is three words).
//! Every word is lowercased and all but the first get an uppercase initial,
//! so acronyms are normalized ("gnss.HDOP" becomes "gnssHdop").

/// Characters that separate words in a path.
fn is_separator(c: char) -> bool {
    matches!(c, '.' | '_' | '-' | ' ')
}

/// Split a path into its words.
fn words(path: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;
    let mut prev_prev: Option<char> = None;

    for c in path.chars() {
        if is_separator(c) {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            prev_prev = None;
            continue;
        }

        let prev_upper = prev.is_some_and(char::is_uppercase);
        let prev_prev_upper = prev_prev.is_some_and(char::is_uppercase);

        if prev.is_some() && !prev_upper && c.is_uppercase() {
            // "speedOver" -> "speed", "Over"
            words.push(std::mem::take(&mut current));
        } else if prev_upper && prev_prev_upper && c.is_lowercase() {
            // "HDOPvalue" -> "HDO", "Pvalue"
            if let Some(last) = current.pop() {
                words.push(std::mem::take(&mut current));
                current.push(last);
            }
        }

        current.push(c);
        prev_prev = prev;
        prev = Some(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Fold a SignalK path into a camelCase field name.
pub fn camel_case(path: &str) -> String {
    let mut out = String::with_capacity(path.len());

    for (i, word) in words(path).iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    out
}
