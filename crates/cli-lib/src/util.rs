use timew_core::{Error, Instant};

pub fn parse_instant(s: &str) -> Result<Instant, String> {
    Instant::parse_iso(s, "timestamp").map_err(fmt_err)
}

/// Accepts `@3` or bare `3`.
pub fn parse_ids(raw: &[String]) -> Result<Vec<u64>, String> {
    raw.iter()
        .map(|s| {
            s.strip_prefix('@')
                .unwrap_or(s)
                .parse::<u64>()
                .map_err(|_| format!("'{s}' is not a valid id"))
        })
        .collect()
}

/// Parses a signed duration like `1h30m`, `-15m`, `45s` into seconds.
pub fn parse_duration_secs(s: &str) -> Result<i64, String> {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, s),
    };
    if rest.is_empty() {
        return Err(format!("'{s}' is not a valid duration"));
    }

    let mut total = 0i64;
    let mut number = String::new();
    for c in rest.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            other => return Err(format!("'{s}' has an unrecognized duration unit {other:?}")),
        };
        let n: i64 = number
            .parse()
            .map_err(|_| format!("'{s}' is not a valid duration"))?;
        total += n * unit;
        number.clear();
    }
    if !number.is_empty() {
        return Err(format!("'{s}' is missing a unit on its trailing number"));
    }
    Ok(sign * total)
}

pub fn fmt_err(e: Error) -> String {
    e.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_with_and_without_at() {
        assert_eq!(parse_ids(&["@3".to_string(), "7".to_string()]).unwrap(), vec![3, 7]);
    }

    #[test]
    fn rejects_non_numeric_id() {
        assert!(parse_ids(&["abc".to_string()]).is_err());
    }

    #[test]
    fn parses_compound_duration() {
        assert_eq!(parse_duration_secs("1h30m").unwrap(), 5400);
        assert_eq!(parse_duration_secs("-15m").unwrap(), -900);
        assert_eq!(parse_duration_secs("45s").unwrap(), 45);
    }

    #[test]
    fn rejects_trailing_number_without_unit() {
        assert!(parse_duration_secs("1h30").is_err());
    }
}
